use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Editor '{0}' has no server snapshot yet")]
    NotReady(String),

    #[error("Editor '{0}' is already loading its snapshot")]
    InitializeInFlight(String),

    #[error("Editor '{0}' is closed")]
    Closed(String),

    #[error("No bearer credential available for '{0}'")]
    MissingCredential(String),

    #[error("Credential rejected by the backend (HTTP {0})")]
    Unauthorized(u16),

    #[error("Backend returned HTTP {0}")]
    Backend(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Persist call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    /// Whether a failed persist may be retried by the next debounce cycle.
    ///
    /// Precondition failures (missing or rejected credential) are final for
    /// the attempted write and must not schedule a retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::Transport(_) | Self::Timeout(_)
        )
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Serialization(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
