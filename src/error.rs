//! Error types for `easyconfig`.

use std::path::PathBuf;

use easyconfig_core::ConfigError;
use thiserror::Error;

/// Primary error type for the `easyconfig` crate.
#[derive(Error, Debug)]
pub enum EasyConfigError {
    /// Error raised by the store or a table.
    #[error(transparent)]
    Store(#[from] ConfigError),

    /// Database already exists where `init` would create one.
    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    /// Database file missing; run `ecfg init` first.
    #[error("Not initialized: {path} does not exist (run `ecfg init`)")]
    NotInitialized { path: PathBuf },

    /// Invalid configuration file or environment override.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Direct SQLite error outside a table operation.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EasyConfigError {
    #[must_use]
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }
}

/// Result type using `EasyConfigError`.
pub type Result<T> = std::result::Result<T, EasyConfigError>;
