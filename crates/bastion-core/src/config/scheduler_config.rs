use serde::{Deserialize, Serialize};

use super::defaults;

/// Task scheduler and background job configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Global cap on simultaneously in-flight tasks. Excess requests queue FIFO.
    pub max_concurrent_tasks: usize,
    /// Interval between ingestion source polls.
    pub ingestion_interval_secs: u64,
    /// Interval between health checks.
    pub health_interval_secs: u64,
    /// Interval between stale session sweeps.
    pub cleanup_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: defaults::DEFAULT_MAX_CONCURRENT_TASKS,
            ingestion_interval_secs: defaults::DEFAULT_INGESTION_INTERVAL_SECS,
            health_interval_secs: defaults::DEFAULT_HEALTH_INTERVAL_SECS,
            cleanup_interval_secs: defaults::DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}
