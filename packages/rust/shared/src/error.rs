//! Error types for notesync.
//!
//! Library crates use [`NoteSyncError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all notesync operations.
#[derive(Debug, thiserror::Error)]
pub enum NoteSyncError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure: connection, timeout, or non-success HTTP status.
    #[error("network error: {0}")]
    Network(String),

    /// The reading platform delivered a response carrying a non-success code.
    #[error("source API error (code {code}): {message}")]
    SourceApi { code: i64, message: String },

    /// The note database rejected a query or write.
    #[error("destination error: {0}")]
    Destination(String),

    /// A response body could not be decoded into the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Input validation error (empty identifier, bad value, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Every attempt allowed by the retry policy failed.
    #[error("gave up after {attempts} attempts: {last_error}")]
    RetryExhausted {
        attempts: u32,
        last_error: Box<NoteSyncError>,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NoteSyncError>;

impl NoteSyncError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
