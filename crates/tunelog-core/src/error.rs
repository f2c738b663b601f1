//! Error types for tunelog-core

use thiserror::Error;

/// Result type alias using tunelog-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while syncing listening history
#[derive(Error, Debug)]
pub enum Error {
    /// Credential exchange was rejected (fatal, never retried)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Play history could not be fetched
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// A record or timestamp could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Conditional write rejected because the version token is stale
    #[error("Write conflict for {path}: stored version changed")]
    Conflict { path: String },

    /// Document store backend error
    #[error("Storage error during {operation} of {path}: {message}")]
    Storage {
        operation: &'static str,
        path: String,
        message: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn storage(
        operation: &'static str,
        path: impl Into<String>,
        message: impl std::fmt::Display,
    ) -> Self {
        Self::Storage {
            operation,
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error is a stale-version rejection of a conditional write.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
