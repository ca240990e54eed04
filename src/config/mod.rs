//! Configuration management for `easyconfig`.
//!
//! Settings are resolved in layers, later layers winning:
//! - Built-in defaults
//! - Workspace config (.easyconfig/config.yaml)
//! - Environment variable overrides (`EASYCONFIG_DB`, `EASYCONFIG_CACHE`)
//! - CLI flags

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EasyConfigError, Result};

/// Workspace directory holding the config file and default database.
pub const CONFIG_DIR: &str = ".easyconfig";
pub const CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_DB: &str = "config.db";

pub const ENV_DB: &str = "EASYCONFIG_DB";
pub const ENV_CACHE: &str = "EASYCONFIG_CACHE";

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database path; relative paths resolve against the workspace.
    pub database: PathBuf,
    /// Enable the in-process query cache.
    pub cache: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: Path::new(CONFIG_DIR).join(DEFAULT_DB),
            cache: true,
        }
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db: Option<PathBuf>,
    pub no_cache: bool,
}

/// Load settings for the workspace rooted at `root`.
///
/// # Errors
///
/// Returns `Yaml` for a malformed config file and `Config` for an invalid
/// environment override.
pub fn load(root: &Path, overrides: &CliOverrides) -> Result<AppConfig> {
    load_with_env(root, overrides, |name| std::env::var(name).ok())
}

/// `load` with an injectable environment lookup.
///
/// # Errors
///
/// Same as `load`.
pub fn load_with_env(
    root: &Path,
    overrides: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> Result<AppConfig> {
    let path = root.join(CONFIG_DIR).join(CONFIG_FILE);
    let mut config = if path.exists() {
        let raw = std::fs::read_to_string(&path)?;
        debug!(path = %path.display(), "loaded config file");
        if raw.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&raw)?
        }
    } else {
        AppConfig::default()
    };

    if let Some(db) = env(ENV_DB).filter(|v| !v.is_empty()) {
        config.database = PathBuf::from(db);
    }
    if let Some(cache) = env(ENV_CACHE) {
        config.cache = parse_bool(ENV_CACHE, &cache)?;
    }

    if let Some(db) = &overrides.db {
        config.database.clone_from(db);
    }
    if overrides.no_cache {
        config.cache = false;
    }

    if config.database.is_relative() {
        config.database = root.join(&config.database);
    }

    Ok(config)
}

/// Render the starter config file written by `ecfg init`.
///
/// # Errors
///
/// Returns `Yaml` if serialization fails.
pub fn starter_yaml() -> Result<String> {
    let body = serde_yaml::to_string(&AppConfig::default())?;
    Ok(format!("# easyconfig workspace configuration\n{body}"))
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EasyConfigError::config(format!(
            "{name} must be a boolean, got '{other}'"
        ))),
    }
}
