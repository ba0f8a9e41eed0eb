use serde::{Deserialize, Serialize};

use super::defaults;

/// Knowledge retriever configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Target chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Default similarity floor for queries.
    pub similarity_threshold: f64,
    /// Default `top_k` for queries.
    pub max_results: usize,
    /// Upper bound on the context block built for prompts.
    pub context_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: defaults::DEFAULT_CHUNK_SIZE,
            chunk_overlap: defaults::DEFAULT_CHUNK_OVERLAP,
            similarity_threshold: defaults::DEFAULT_SIMILARITY_THRESHOLD,
            max_results: defaults::DEFAULT_MAX_RESULTS,
            context_max_chars: defaults::DEFAULT_CONTEXT_MAX_CHARS,
        }
    }
}
