use parley_graph::BuildError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SupportError {
    #[error("invalid support configuration: {0}")]
    Config(String),
    #[error("failed to read support configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse support configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Build(#[from] BuildError),
}
