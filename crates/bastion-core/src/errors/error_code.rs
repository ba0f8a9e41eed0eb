//! Stable error kinds.
//!
//! Messages change; codes do not. Callers on the far side of the transport
//! match on these strings.

/// Every Bastion error enum implements this to expose a stable kind.
pub trait BastionErrorCode {
    /// Returns the stable error code (e.g., "SESSION_BUSY").
    fn error_code(&self) -> &'static str;

    /// `[ERROR_CODE] message`, the form written to logs.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

// Session
pub const DUPLICATE_SESSION: &str = "DUPLICATE_SESSION";
pub const PHASE_ORDER: &str = "PHASE_ORDER";
pub const SESSION_BUSY: &str = "SESSION_BUSY";
pub const SESSION_CLOSED: &str = "SESSION_CLOSED";
pub const SESSION_NOT_FOUND: &str = "SESSION_NOT_FOUND";
pub const EMPTY_TRANSCRIPT: &str = "EMPTY_TRANSCRIPT";
pub const PHASE_TIMEOUT: &str = "PHASE_TIMEOUT";
pub const PHASE_ANALYSIS_FAILED: &str = "PHASE_ANALYSIS_FAILED";
pub const UNKNOWN_PHASE: &str = "UNKNOWN_PHASE";
pub const INVALID_TARGET: &str = "INVALID_TARGET";

// Retrieval
pub const EMBEDDING_INCONSISTENCY: &str = "EMBEDDING_INCONSISTENCY";
pub const UNKNOWN_COLLECTION: &str = "UNKNOWN_COLLECTION";
pub const INVALID_QUERY: &str = "INVALID_QUERY";
pub const INVALID_DOCUMENT: &str = "INVALID_DOCUMENT";

// Adapters
pub const ADAPTER_UNAVAILABLE: &str = "ADAPTER_UNAVAILABLE";
pub const ADAPTER_TIMEOUT: &str = "ADAPTER_TIMEOUT";
pub const ADAPTER_FAILED: &str = "ADAPTER_FAILED";
pub const ADAPTER_MISSING_INPUT: &str = "ADAPTER_MISSING_INPUT";
pub const ADAPTER_PANICKED: &str = "ADAPTER_PANICKED";
pub const NO_ADAPTER: &str = "NO_ADAPTER";

// Embeddings
pub const EMBEDDING_ERROR: &str = "EMBEDDING_ERROR";

// Storage
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const MIGRATION_FAILED: &str = "MIGRATION_FAILED";
pub const DB_CORRUPT: &str = "DB_CORRUPT";

// Misc
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
pub const SHUTTING_DOWN: &str = "SHUTTING_DOWN";
