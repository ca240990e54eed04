//! Command implementations.
//!
//! Each command opens the SQLite-backed store through [`Context`] and
//! prints either text or JSON.

pub mod get;
pub mod global;
pub mod group;
pub mod init;
pub mod list;
pub mod remove;
pub mod set;
pub mod user;

use std::path::PathBuf;

use easyconfig_core::{BaseConfig, CachePort, ConfigStore, ConfigValue, NoCache, RegionCache};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::{EasyConfigError, Result};
use crate::storage::SqliteTable;

/// Store type used by every command.
pub type SqliteStore =
    ConfigStore<BaseConfig, SqliteTable<BaseConfig>, Box<dyn CachePort<BaseConfig>>>;

/// Resolved invocation settings.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub config: AppConfig,
    pub json: bool,
}

impl Context {
    /// Open the configured database as a store.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the database file is missing, or a store
    /// error if it cannot be opened or holds a different schema.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = &self.config.database;
        if !path.exists() {
            return Err(EasyConfigError::NotInitialized { path: path.clone() });
        }
        let table = SqliteTable::open(path)?;
        let cache: Box<dyn CachePort<BaseConfig>> = if self.config.cache {
            Box::new(RegionCache::new())
        } else {
            Box::new(NoCache)
        };
        Ok(ConfigStore::new(table, cache)?)
    }

    /// Print `value` as pretty JSON on stdout.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

/// Parse a CLI value: JSON when it parses, otherwise the raw string.
#[must_use]
pub fn parse_value(raw: &str, as_string: bool) -> ConfigValue {
    if as_string {
        return ConfigValue::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| ConfigValue::String(raw.to_string()))
}

/// Split `key=value`.
///
/// # Errors
///
/// Returns `Config` if there is no `=` or the key is empty.
pub fn split_pair(raw: &str) -> Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(EasyConfigError::config(format!(
            "expected KEY=VALUE, got '{raw}'"
        ))),
    }
}
