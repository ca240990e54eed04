//! Error types for `easyconfig-core`.
//!
//! Absence of a key and a skipped write to a locked entry are not errors;
//! they surface as `None` and `SaveOutcome::SkippedLocked` respectively.

use thiserror::Error;

/// Boxed error produced by a table or cache backend.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Primary error type for easyconfig-core operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    // === Construction Errors ===
    /// The table stores a different entry kind than the store is bound to.
    #[error("Unrecognized schema kind: expected '{expected}', table holds '{found}'")]
    UnrecognizedSchemaKind { expected: String, found: String },

    // === Key Errors ===
    /// Dotted key is empty or contains an empty segment.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    // === Storage Errors ===
    /// Failure raised by the storage collaborator, passed through untouched.
    #[error("Backend error: {0}")]
    Backend(#[source] BackendError),

    /// Table used in a way it cannot serve (poisoned lock, missing path).
    #[error("Storage error: {0}")]
    Storage(String),

    /// Failed to parse a line in a JSONL table file.
    #[error("JSONL parse error at line {line}: {reason}")]
    JsonlParse { line: usize, reason: String },

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConfigError {
    #[must_use]
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a collaborator error without reinterpreting it.
    #[must_use]
    pub fn backend(err: impl Into<BackendError>) -> Self {
        Self::Backend(err.into())
    }

    /// Error for a mutex that was poisoned by a panicking writer.
    #[must_use]
    pub fn poisoned(what: &str) -> Self {
        Self::Storage(format!("{what} lock poisoned"))
    }
}

/// Result type using `ConfigError`.
pub type Result<T> = std::result::Result<T, ConfigError>;
