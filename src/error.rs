//! Error types for arr-unpacker
//!
//! Nothing in the extraction lifecycle is fatal. These errors surface from the
//! edges (configuration, queue polling, archive extraction) and are logged by
//! the loops that call them, which then retry on the next cycle.

use crate::types::Application;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for arr-unpacker operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for arr-unpacker
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "poll_interval")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error talking to a queue API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The queue API answered, but not with a usable snapshot
    #[error("{application} queue fetch failed: {reason}")]
    QueueFetch {
        /// Application whose queue could not be fetched
        application: Application,
        /// Why the fetch failed (HTTP status, missing endpoint, ...)
        reason: String,
    },

    /// Archive extraction failed
    #[error("extraction failed for {}: {reason}", archive.display())]
    Extraction {
        /// The archive that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },

    /// Shutdown in progress
    #[error("shutdown in progress")]
    ShuttingDown,
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
