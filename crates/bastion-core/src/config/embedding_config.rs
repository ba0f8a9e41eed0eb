use serde::{Deserialize, Serialize};

use super::defaults;

/// Embedding subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type: "hashed" (local TF-IDF hashing) or "http".
    pub provider: String,
    /// Model name. Part of the embedding fingerprint.
    pub model: String,
    /// Endpoint for the http provider.
    pub endpoint: Option<String>,
    /// Embedding dimensions.
    pub dimensions: usize,
    /// L1 in-memory cache max entries.
    pub l1_cache_size: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: defaults::DEFAULT_EMBEDDING_PROVIDER.to_string(),
            model: defaults::DEFAULT_EMBEDDING_MODEL.to_string(),
            endpoint: None,
            dimensions: defaults::DEFAULT_EMBEDDING_DIMENSIONS,
            l1_cache_size: defaults::DEFAULT_L1_CACHE_SIZE,
        }
    }
}
