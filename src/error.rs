//! Error types for debian-upgrader.

use thiserror::Error;

/// Result type for upgrader operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can abort an upgrade run.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The host is not Debian-derived.
    #[error("unsupported operating system: {0}")]
    UnsupportedOs(String),

    /// The installed Debian version has no upgrade path.
    #[error("unsupported Debian version: {0}")]
    UnsupportedVersion(String),

    /// A release name with no source-list template.
    #[error("unsupported target release: {0}")]
    UnsupportedRelease(String),

    /// The operator answered no to a required confirmation.
    #[error("operator declined {0}")]
    Declined(String),

    /// A command ran but exited unsuccessfully.
    #[error("command `{command}` failed: {status}")]
    CommandFailed {
        /// The command line that was run.
        command: String,
        /// Exit status description.
        status: String,
    },

    /// A command could not be started.
    #[error("failed to start `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },

    /// Signing key retrieval produced no usable key.
    #[error("key retrieval failed: {0}")]
    KeyFetch(String),

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
