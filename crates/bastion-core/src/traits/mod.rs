mod adapter;
mod audit_sink;
mod embedding;
mod ingestion;
mod storage;

pub use adapter::ICapabilityAdapter;
pub use audit_sink::IAuditSink;
pub use embedding::IEmbeddingProvider;
pub use ingestion::{IIngestionSource, IngestionDocument};
pub use storage::{IChunkStore, ISessionStore};
