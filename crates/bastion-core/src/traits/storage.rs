use async_trait::async_trait;

use crate::errors::BastionResult;
use crate::models::{Collection, DocumentChunk, EmbeddingFingerprint, PhaseRecord, Session};

/// Persistent chunk storage keyed by `(collection, chunk_id)`.
#[async_trait]
pub trait IChunkStore: Send + Sync {
    /// Replace every chunk of `source_id` with `chunks` in one transaction.
    async fn replace_source(&self, source_id: &str, chunks: &[DocumentChunk]) -> BastionResult<()>;

    async fn remove_source(&self, source_id: &str) -> BastionResult<usize>;

    async fn purge_collection(&self, collection: Collection) -> BastionResult<usize>;

    async fn load_chunks(&self) -> BastionResult<Vec<DocumentChunk>>;

    /// Drop every chunk and record `fingerprint` as the current one.
    async fn reset(&self, fingerprint: &EmbeddingFingerprint) -> BastionResult<()>;

    async fn load_fingerprint(&self) -> BastionResult<Option<EmbeddingFingerprint>>;

    async fn store_fingerprint(&self, fingerprint: &EmbeddingFingerprint) -> BastionResult<()>;
}

/// Session headers plus an append-only phase transcript.
#[async_trait]
pub trait ISessionStore: Send + Sync {
    /// Insert or update the session header (status, report, timestamps).
    async fn save_session(&self, session: &Session) -> BastionResult<()>;

    /// Append `records` at transcript positions `start_seq..` and save the
    /// header, in one transaction. Nothing is written on error.
    async fn append_phases(
        &self,
        session: &Session,
        start_seq: usize,
        records: &[PhaseRecord],
    ) -> BastionResult<()>;

    async fn load_session(&self, session_id: &str) -> BastionResult<Option<Session>>;

    async fn load_active_sessions(&self) -> BastionResult<Vec<Session>>;
}
