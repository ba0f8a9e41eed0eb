//! StorageEngine: owns the write connection and implements the chunk,
//! session, and audit stores.

use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use bastion_core::config::StorageConfig;
use bastion_core::errors::BastionResult;
use bastion_core::models::{
    AuditKind, AuditRecord, Collection, DocumentChunk, EmbeddingFingerprint, PhaseRecord, Session,
    SessionStatus,
};
use bastion_core::traits::{IAuditSink, IChunkStore, ISessionStore};

use crate::migrations;
use crate::pool::WriteConnection;
use crate::queries::{audit_ops, chunk_ops, session_ops};

pub struct StorageEngine {
    writer: WriteConnection,
}

impl StorageEngine {
    /// Open a file-backed engine, running migrations before first use.
    pub fn open(path: &Path) -> BastionResult<Self> {
        let writer = WriteConnection::open(path, |conn| {
            migrations::run_migrations(conn).map(|_| ())
        })?;
        info!(path = %path.display(), "storage opened");
        Ok(Self { writer })
    }

    pub fn open_in_memory() -> BastionResult<Self> {
        let writer =
            WriteConnection::open_in_memory(|conn| migrations::run_migrations(conn).map(|_| ()))?;
        Ok(Self { writer })
    }

    pub fn from_config(config: &StorageConfig) -> BastionResult<Self> {
        match &config.db_path {
            Some(path) => Self::open(Path::new(path)),
            None => Self::open_in_memory(),
        }
    }

    pub async fn schema_version(&self) -> BastionResult<u32> {
        self.writer.with_conn(migrations::current_version).await
    }

    pub async fn chunk_count(&self) -> BastionResult<usize> {
        self.writer.with_conn(chunk_ops::count_chunks).await
    }

    pub async fn audit_trail(&self, subject_id: &str) -> BastionResult<Vec<AuditRecord>> {
        self.writer
            .with_conn(|conn| audit_ops::query_by_subject(conn, subject_id))
            .await
    }

    pub async fn audit_count(&self, kind: AuditKind) -> BastionResult<usize> {
        self.writer
            .with_conn(|conn| audit_ops::count_by_kind(conn, kind))
            .await
    }

    /// Cheap round-trip used by the health check.
    pub async fn ping(&self) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))
                    .map_err(|e| crate::to_storage_err(e.to_string()))
            })
            .await
    }
}

#[async_trait]
impl IChunkStore for StorageEngine {
    async fn replace_source(&self, source_id: &str, chunks: &[DocumentChunk]) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| chunk_ops::replace_source(conn, source_id, chunks))
            .await
    }

    async fn remove_source(&self, source_id: &str) -> BastionResult<usize> {
        self.writer
            .with_conn(|conn| chunk_ops::delete_source(conn, source_id))
            .await
    }

    async fn purge_collection(&self, collection: Collection) -> BastionResult<usize> {
        self.writer
            .with_conn(|conn| chunk_ops::delete_collection(conn, collection))
            .await
    }

    async fn load_chunks(&self) -> BastionResult<Vec<DocumentChunk>> {
        self.writer.with_conn(chunk_ops::load_all).await
    }

    async fn reset(&self, fingerprint: &EmbeddingFingerprint) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| {
                let tx = conn
                    .unchecked_transaction()
                    .map_err(|e| crate::to_storage_err(e.to_string()))?;
                chunk_ops::delete_all(&tx)?;
                chunk_ops::store_fingerprint(&tx, fingerprint)?;
                tx.commit().map_err(|e| crate::to_storage_err(e.to_string()))
            })
            .await
    }

    async fn load_fingerprint(&self) -> BastionResult<Option<EmbeddingFingerprint>> {
        self.writer.with_conn(chunk_ops::load_fingerprint).await
    }

    async fn store_fingerprint(&self, fingerprint: &EmbeddingFingerprint) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| chunk_ops::store_fingerprint(conn, fingerprint))
            .await
    }
}

#[async_trait]
impl ISessionStore for StorageEngine {
    async fn save_session(&self, session: &Session) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| session_ops::upsert_session(conn, session))
            .await
    }

    async fn append_phases(
        &self,
        session: &Session,
        start_seq: usize,
        records: &[PhaseRecord],
    ) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| session_ops::append_phases(conn, session, start_seq, records))
            .await
    }

    async fn load_session(&self, session_id: &str) -> BastionResult<Option<Session>> {
        self.writer
            .with_conn(|conn| session_ops::get_session(conn, session_id))
            .await
    }

    async fn load_active_sessions(&self) -> BastionResult<Vec<Session>> {
        self.writer
            .with_conn(|conn| session_ops::list_sessions_by_status(conn, SessionStatus::Active))
            .await
    }
}

#[async_trait]
impl IAuditSink for StorageEngine {
    async fn record(&self, record: AuditRecord) -> BastionResult<()> {
        self.writer
            .with_conn(|conn| audit_ops::insert_audit_record(conn, &record))
            .await
    }
}
