// Single source of truth for all default values.

// --- Scheduler ---
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 8;
pub const DEFAULT_INGESTION_INTERVAL_SECS: u64 = 21_600; // 6 hours
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 3_600; // 1 hour
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 1_800; // 30 minutes

// --- Router ---
pub const DEFAULT_ADAPTER_TIMEOUT_SECS: f64 = 300.0;
pub const DEFAULT_RELEVANCE_THRESHOLD: f64 = 0.3;
pub const DEFAULT_FALLBACK_ADAPTER: &str = crate::constants::ADAPTER_GENERAL;

// --- Session ---
pub const DEFAULT_PHASE_TIMEOUT_SECS: f64 = 900.0;
pub const DEFAULT_SESSION_INACTIVITY_SECS: u64 = 86_400; // 24 hours
pub const DEFAULT_SESSION_RETENTION_SECS: u64 = 3_600;

// --- Timeouts ---
/// Upper bound for any configured timeout.
pub const MAX_TIMEOUT_SECS: f64 = 86_400.0; // 24 hours

// --- Retrieval ---
pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.7;
pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_CONTEXT_MAX_CHARS: usize = 2_000;

// --- Embeddings ---
pub const DEFAULT_EMBEDDING_PROVIDER: &str = "hashed";
pub const DEFAULT_EMBEDDING_MODEL: &str = "hashed-tfidf-v1";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_L1_CACHE_SIZE: u64 = 10_000;
pub const MIN_EMBEDDING_DIMENSIONS: usize = 8;

// --- Adapters ---
pub const DEFAULT_HEALTH_PATH: &str = "/health";

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
