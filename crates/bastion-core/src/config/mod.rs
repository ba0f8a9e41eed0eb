pub mod adapters_config;
pub mod bastion_config;
pub mod defaults;
pub mod embedding_config;
pub mod observability_config;
pub mod retrieval_config;
pub mod router_config;
pub mod scheduler_config;
pub mod session_config;
pub mod storage_config;

pub use adapters_config::{AdapterConfig, AdaptersConfig, BackendKind};
pub use bastion_config::BastionConfig;
pub use embedding_config::EmbeddingConfig;
pub use observability_config::ObservabilityConfig;
pub use retrieval_config::RetrievalConfig;
pub use router_config::RouterConfig;
pub use scheduler_config::SchedulerConfig;
pub use session_config::SessionConfig;
pub use storage_config::StorageConfig;

use std::time::Duration;

/// Seconds to a `Duration`, clamped to `[0, MAX_TIMEOUT_SECS]`.
pub(crate) fn timeout_duration(secs: f64) -> Duration {
    let capped = if secs.is_nan() {
        defaults::MAX_TIMEOUT_SECS
    } else {
        secs.clamp(0.0, defaults::MAX_TIMEOUT_SECS)
    };
    Duration::from_secs_f64(capped)
}
