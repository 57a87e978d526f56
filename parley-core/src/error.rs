use std::time::Duration;

use thiserror::Error;

/// Failures a step handler or a checkpoint store may report.
#[derive(Debug, Error)]
pub enum ParleyError {
    #[error("Handler failed: {0}")]
    Handler(String),
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Operation was cancelled")]
    Cancelled,
    #[error("Checkpoint failed: {0}")]
    CheckpointFailed(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Serialization/deserialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("{0}")]
    Custom(String),
}

impl ParleyError {
    pub fn handler(message: impl Into<String>) -> Self {
        ParleyError::Handler(message.into())
    }
}
