//! Per-subsystem health checks: storage, knowledge, adapters, scheduler.

use bastion_core::models::{HealthStatus, SubsystemHealth};

use super::reporter::HealthSnapshot;

pub struct SubsystemChecker;

impl SubsystemChecker {
    pub fn check_all(snapshot: &HealthSnapshot) -> Vec<SubsystemHealth> {
        vec![
            Self::check_storage(snapshot),
            Self::check_knowledge(snapshot),
            Self::check_adapters(snapshot),
            Self::check_scheduler(snapshot),
        ]
    }

    /// Storage: unhealthy when the check failed.
    fn check_storage(snapshot: &HealthSnapshot) -> SubsystemHealth {
        match &snapshot.storage_error {
            Some(error) => subsystem(
                "storage",
                HealthStatus::Unhealthy,
                Some(format!("storage check failed: {error}")),
            ),
            None => subsystem("storage", HealthStatus::Healthy, None),
        }
    }

    /// Knowledge: unhealthy on an embedding mismatch, degraded when empty.
    fn check_knowledge(snapshot: &HealthSnapshot) -> SubsystemHealth {
        if !snapshot.knowledge_consistent {
            subsystem(
                "knowledge",
                HealthStatus::Unhealthy,
                Some("embedding fingerprint mismatch; index reset required".into()),
            )
        } else if snapshot.indexed_chunks == 0 {
            subsystem(
                "knowledge",
                HealthStatus::Degraded,
                Some("knowledge base is empty".into()),
            )
        } else {
            subsystem("knowledge", HealthStatus::Healthy, None)
        }
    }

    /// Adapters: unhealthy when none is reachable, degraded when some are down.
    fn check_adapters(snapshot: &HealthSnapshot) -> SubsystemHealth {
        let down: Vec<&str> = snapshot
            .adapters
            .iter()
            .filter(|(_, up)| !up)
            .map(|(name, _)| name.as_str())
            .collect();
        if snapshot.adapters.is_empty() || down.len() == snapshot.adapters.len() {
            subsystem(
                "adapters",
                HealthStatus::Unhealthy,
                Some("no capability adapter is available".into()),
            )
        } else if !down.is_empty() {
            subsystem(
                "adapters",
                HealthStatus::Degraded,
                Some(format!("unavailable: {}", down.join(", "))),
            )
        } else {
            subsystem("adapters", HealthStatus::Healthy, None)
        }
    }

    /// Scheduler: degraded while every slot is taken.
    fn check_scheduler(snapshot: &HealthSnapshot) -> SubsystemHealth {
        if snapshot.max_concurrent_tasks > 0
            && snapshot.in_flight_tasks >= snapshot.max_concurrent_tasks
        {
            subsystem(
                "scheduler",
                HealthStatus::Degraded,
                Some(format!(
                    "at capacity ({}/{})",
                    snapshot.in_flight_tasks, snapshot.max_concurrent_tasks
                )),
            )
        } else {
            subsystem("scheduler", HealthStatus::Healthy, None)
        }
    }
}

fn subsystem(name: &str, status: HealthStatus, message: Option<String>) -> SubsystemHealth {
    SubsystemHealth {
        name: name.to_string(),
        status,
        message,
    }
}
