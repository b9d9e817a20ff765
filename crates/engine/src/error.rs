use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// An operation was invoked outside the construct -> start ->
    /// shutdown -> report lifecycle.
    #[error("invalid engine state: {0}")]
    InvalidState(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
