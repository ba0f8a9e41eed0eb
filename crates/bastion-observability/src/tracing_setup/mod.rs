//! Tracing setup: subscriber installation, span macros, and event helpers.

pub mod events;
pub mod spans;

use bastion_core::config::ObservabilityConfig;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const LOG_ENV: &str = "BASTION_LOG";

/// Resolve the filter: `BASTION_LOG` when it parses, else the configured
/// level, else `info`.
pub fn env_filter(config: &ObservabilityConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed, which makes
/// repeated calls (tests, embedding hosts) harmless.
pub fn init_tracing(config: &ObservabilityConfig) -> bool {
    let filter = env_filter(config);
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if config.json_logs {
        builder
            .with_file(true)
            .with_line_number(true)
            .json()
            .try_init()
            .is_ok()
    } else {
        builder.try_init().is_ok()
    };
    if installed {
        tracing::debug!(json = config.json_logs, level = %config.log_level, "tracing initialized");
    }
    installed
}
