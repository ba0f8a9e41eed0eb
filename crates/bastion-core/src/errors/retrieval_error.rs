use super::error_code::{self, BastionErrorCode};

/// Knowledge retriever errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    /// Stored vectors were produced by a different embedding function.
    /// Nothing is queryable until the index is reset and re-ingested.
    #[error("embedding fingerprint mismatch: store has {stored}, current is {current}")]
    EmbeddingInconsistency { stored: String, current: String },

    #[error("unknown collection: {name}")]
    UnknownCollection { name: String },

    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },

    #[error("invalid document {source_id}: {reason}")]
    InvalidDocument { source_id: String, reason: String },
}

impl BastionErrorCode for RetrievalError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmbeddingInconsistency { .. } => error_code::EMBEDDING_INCONSISTENCY,
            Self::UnknownCollection { .. } => error_code::UNKNOWN_COLLECTION,
            Self::InvalidQuery { .. } => error_code::INVALID_QUERY,
            Self::InvalidDocument { .. } => error_code::INVALID_DOCUMENT,
        }
    }
}
