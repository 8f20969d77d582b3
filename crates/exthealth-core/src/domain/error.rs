//! Error taxonomy for exthealth.

use exthealth_state::StoreError;

/// Failures reported by host collaborators.
///
/// These never abort a scan: the aggregator logs them and scores the
/// affected extension as having an unknown update time.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("extension not found: {0}")]
    UnknownExtension(String),

    #[error("timestamp lookup for {id} timed out after {timeout_ms}ms")]
    Timeout { id: String, timeout_ms: u64 },

    #[error("timestamp lookup for {id} failed: {source}")]
    Io {
        id: String,
        #[source]
        source: std::io::Error,
    },

    #[error("host error: {0}")]
    Other(String),
}

/// Result type for host collaborator calls.
pub type HostResult<T> = std::result::Result<T, HostError>;

/// exthealth domain errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("monitor has been shut down")]
    ShutDown,
}

/// Result type for exthealth domain operations.
pub type Result<T> = std::result::Result<T, HealthError>;
