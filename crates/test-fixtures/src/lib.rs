//! Shared stubs and data for Bastion tests.
//!
//! Anything here may panic on misuse; it is only ever linked into tests.

pub mod audit;
pub mod corpus;
pub mod stub_adapter;

use std::path::PathBuf;

use bastion_core::BastionConfig;
use serde::de::DeserializeOwned;

pub use audit::RecordingAuditSink;
pub use stub_adapter::{StubAdapter, StubOutcome};

fn data_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data")
}

/// Load and deserialize a JSON file from `test-fixtures/data`.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = data_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Defaults shrunk for tests: small chunks, short timeouts, in-memory storage.
pub fn test_config() -> BastionConfig {
    let mut config = BastionConfig::default();
    config.scheduler.max_concurrent_tasks = 4;
    config.router.adapter_timeout_seconds = 2.0;
    config.session.phase_timeout_seconds = 2.0;
    config.retrieval.chunk_size = 200;
    config.retrieval.chunk_overlap = 40;
    config.retrieval.similarity_threshold = 0.2;
    config.embedding.dimensions = 128;
    config.embedding.l1_cache_size = 1_000;
    config.storage.db_path = None;
    config
}
