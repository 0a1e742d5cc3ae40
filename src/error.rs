//! # Error Handling
//!
//! This module defines the centralized error type for `community-sync`. It
//! uses `thiserror` to build a single `Error` enum covering every failure the
//! reconciliation core can surface, so the binary can print one readable
//! message and exit non-zero.
//!
//! ## Key Components
//!
//! - **`Error`**: every failure mode of the library. Variants carry the
//!   context needed to act on them (the pattern, the remote operation, the
//!   local path).
//! - **`Result<T>`**: alias for `std::result::Result<T, Error>`.
//!
//! ## Recoverability
//!
//! Only [`Error::RemoteNotFound`] is recovered inside the library: team setup
//! turns it into a create call. Everything else propagates to the caller and
//! aborts the run. Mutations already sent to GitHub are never rolled back.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for community-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A `repos.toml` or `teams.toml` document could not be parsed.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// A glob pattern in the configuration or on the command line is malformed.
    #[error("Invalid glob pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Two patterns of equal length matched the same repository.
    ///
    /// Only produced when the caller asks for strict resolution.
    #[error("Patterns of equal specificity both match {repo}: {}", patterns.join(", "))]
    PatternCollision { repo: String, patterns: Vec<String> },

    /// The remote resource does not exist (HTTP 404).
    #[error("Remote resource not found: {resource}")]
    RemoteNotFound { resource: String },

    /// Any other failure talking to GitHub.
    #[error("Remote operation '{operation}' failed{}: {message}", status.map(|s| format!(" with status {}", s)).unwrap_or_default())]
    Remote {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// A local reference workflow file is missing or unreadable.
    #[error("Failed to read reference file {}: {source}", path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The remote returned content this crate could not decode.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` for the 404-class condition callers may recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RemoteNotFound { .. })
    }

    pub(crate) fn remote(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Remote {
            operation: operation.into(),
            status: None,
            message: message.into(),
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
