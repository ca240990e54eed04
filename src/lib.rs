//! `easyconfig` - Hierarchical per-user/group configuration store
//!
//! This crate provides a SQLite-backed table for the store in
//! `easyconfig-core`, plus the `ecfg` CLI built on it.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`cli`] - Command-line interface using clap
//! - [`storage`] - `SQLite` table implementing `EntityTable`
//! - [`config`] - Workspace configuration (YAML + environment)
//! - [`error`] - Error types and handling
//! - [`format`] - Output formatting (text, JSON)
//! - [`logging`] - `tracing` subscriber setup
//!
//! The store itself ([`ConfigStore`]) and its collaborators are re-exported
//! from `easyconfig-core`.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod storage;

pub use easyconfig_core::{
    BaseConfig, CachePort, CacheRegion, ConfigEntry, ConfigError, ConfigStore, ConfigValue,
    EntityTable, InMemoryTable, KeyPath, NoCache, RegionCache, SaveOptions, SaveOutcome,
};
pub use error::{EasyConfigError, Result};
pub use storage::SqliteTable;

/// Run the CLI application.
///
/// This is the main entry point called from `main()`.
///
/// # Errors
///
/// Returns an error if command execution fails.
pub fn run() -> anyhow::Result<()> {
    cli::run()
}
