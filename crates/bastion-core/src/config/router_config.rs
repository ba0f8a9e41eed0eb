use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Classification and dispatch configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Per-adapter deadline for one fan-out branch.
    pub adapter_timeout_seconds: f64,
    /// Classification cutoff. Adapters scoring at or above it are dispatched.
    pub relevance_threshold: f64,
    /// Adapter used when nothing clears the threshold.
    pub fallback_adapter: String,
}

impl RouterConfig {
    /// Clamped to `MAX_TIMEOUT_SECS`; `validate` rejects values outside it.
    pub fn adapter_timeout(&self) -> Duration {
        super::timeout_duration(self.adapter_timeout_seconds)
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_seconds: defaults::DEFAULT_ADAPTER_TIMEOUT_SECS,
            relevance_threshold: defaults::DEFAULT_RELEVANCE_THRESHOLD,
            fallback_adapter: defaults::DEFAULT_FALLBACK_ADAPTER.to_string(),
        }
    }
}
