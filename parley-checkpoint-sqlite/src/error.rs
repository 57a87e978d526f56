use thiserror::Error;

#[derive(Debug, Error)]
pub enum CheckpointSqlError {
    #[error("failed to connect to checkpoint database: {0}")]
    Connection(#[source] sqlx::Error),
    #[error("failed to run checkpoint migrations: {0}")]
    Migration(#[source] sqlx::Error),
    #[error("checkpoint query failed: {0}")]
    Query(#[source] sqlx::Error),
    #[error("failed to encode checkpoint state: {0}")]
    Serialization(#[source] serde_json::Error),
    #[error("stored checkpoint is invalid: {0}")]
    Corrupt(String),
}
