use super::error_code::{self, BastionErrorCode};
use super::{
    AdapterError, ConfigError, EmbeddingError, RetrievalError, SessionError, StorageError,
};

/// Top-level error for every fallible Bastion operation.
#[derive(Debug, thiserror::Error)]
pub enum BastionError {
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("adapter error: {0}")]
    Adapter(#[from] AdapterError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("task join error: {reason}")]
    Join { reason: String },

    #[error("runtime is shutting down")]
    ShuttingDown,
}

pub type BastionResult<T> = Result<T, BastionError>;

impl BastionErrorCode for BastionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Session(e) => e.error_code(),
            Self::Retrieval(e) => e.error_code(),
            Self::Adapter(e) => e.error_code(),
            Self::Embedding(e) => e.error_code(),
            Self::Storage(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Serialization(_) => error_code::SERIALIZATION_ERROR,
            Self::Join { .. } => error_code::INTERNAL_ERROR,
            Self::ShuttingDown => error_code::SHUTTING_DOWN,
        }
    }
}
