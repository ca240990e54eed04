//! `SQLite` storage layer for `easyconfig`.
//!
//! Provides an `EntityTable` over a single `config_entries` table with:
//! - WAL mode for concurrent reads
//! - One transaction per commit
//! - Prefix queries through `LIKE ... ESCAPE`
//!
//! # Submodules
//!
//! - [`sqlite`] - `SqliteTable` and schema setup

pub mod sqlite;

pub use sqlite::{SCHEMA_SQL, SqliteTable, escape_like};
