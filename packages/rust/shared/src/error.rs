//! Error types for the wishlist compiler.
//!
//! Library crates use [`WishlistError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all wishlist operations.
#[derive(Debug, thiserror::Error)]
pub enum WishlistError {
    /// Configuration loading or credential error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Listing or change-history request against the remote store failed.
    #[error("remote access error: {0}")]
    RemoteAccess(String),

    /// One or more files could not be assigned an ordering key.
    #[error("ordering error: no ordering key for {}", unmatched.join(", "))]
    Ordering { unmatched: Vec<String> },

    /// Per-file content could not be fetched.
    #[error("fetch error for {target}: {message}")]
    Fetch { target: String, message: String },

    /// File content is not valid UTF-8.
    #[error("decode error for {target}: {message}")]
    Decode { target: String, message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration value (bad URL, missing repository, unusable output path).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, WishlistError>;

impl WishlistError {
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

    /// Create a fetch error for a file path or URL.
    pub fn fetch(target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Fetch {
            target: target.into(),
            message: msg.into(),
        }
    }

    /// Create a decode error for a file path or URL.
    pub fn decode(target: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            target: target.into(),
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
