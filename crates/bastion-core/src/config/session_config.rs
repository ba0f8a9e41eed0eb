use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Phased session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Deadline for one phase analysis. Exceeding it aborts the session.
    pub phase_timeout_seconds: f64,
    /// Active sessions idle longer than this are aborted by cleanup.
    pub inactivity_timeout_secs: u64,
    /// Closed sessions stay in memory this long before cleanup drops them.
    pub retention_secs: u64,
}

impl SessionConfig {
    /// Clamped to `MAX_TIMEOUT_SECS`; `validate` rejects values outside it.
    pub fn phase_timeout(&self) -> Duration {
        super::timeout_duration(self.phase_timeout_seconds)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            phase_timeout_seconds: defaults::DEFAULT_PHASE_TIMEOUT_SECS,
            inactivity_timeout_secs: defaults::DEFAULT_SESSION_INACTIVITY_SECS,
            retention_secs: defaults::DEFAULT_SESSION_RETENTION_SECS,
        }
    }
}
