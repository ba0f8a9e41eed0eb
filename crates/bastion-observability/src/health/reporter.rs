//! Aggregate health report generation.

use bastion_core::models::{HealthMetrics, HealthReport, HealthStatus, SubsystemHealth};

use super::subsystem_checks::SubsystemChecker;

/// Point-in-time facts gathered from the running components.
#[derive(Debug, Clone, Default)]
pub struct HealthSnapshot {
    /// `None` when the storage check itself failed.
    pub storage_error: Option<String>,
    pub knowledge_consistent: bool,
    pub indexed_chunks: usize,
    /// `(adapter name, available)` in registration order.
    pub adapters: Vec<(String, bool)>,
    pub active_sessions: usize,
    pub in_flight_tasks: usize,
    pub max_concurrent_tasks: usize,
}

/// Builds a [`HealthReport`] from a snapshot and subsystem checks.
pub struct HealthReporter;

impl HealthReporter {
    pub fn build(snapshot: &HealthSnapshot) -> HealthReport {
        let subsystems = SubsystemChecker::check_all(snapshot);
        let overall_status = Self::derive_overall(&subsystems);

        HealthReport {
            overall_status,
            subsystems,
            metrics: HealthMetrics {
                indexed_chunks: snapshot.indexed_chunks,
                active_sessions: snapshot.active_sessions,
                available_adapters: snapshot.adapters.iter().filter(|(_, up)| *up).count(),
                total_adapters: snapshot.adapters.len(),
                in_flight_tasks: snapshot.in_flight_tasks,
            },
        }
    }

    /// Unhealthy if any subsystem is unhealthy, degraded if any is degraded,
    /// otherwise healthy.
    fn derive_overall(subsystems: &[SubsystemHealth]) -> HealthStatus {
        subsystems
            .iter()
            .map(|s| s.status)
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }
}
