//! Error types for exthealth-state

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the settings persistence layer
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("settings I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blob could not be encoded
    #[error("settings serialization failed: {0}")]
    Serialization(String),

    /// The stored bytes are not valid JSON
    #[error("settings file {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// Failure injected by a fake store
    #[error("settings store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
