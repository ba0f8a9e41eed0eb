//! Gathers a [`HealthSnapshot`] from the live components.

use std::sync::Arc;

use bastion_adapters::AdapterRegistry;
use bastion_core::models::HealthReport;
use bastion_observability::{HealthReporter, HealthSnapshot};
use bastion_retrieval::retriever::KnowledgeRetriever;
use bastion_session::SessionStateMachine;
use bastion_storage::StorageEngine;

use crate::scheduler::Scheduler;

/// Cheap to clone; shared with the health interval job.
#[derive(Clone)]
pub struct HealthCollector {
    pub(crate) storage: Arc<StorageEngine>,
    pub(crate) retriever: Arc<KnowledgeRetriever>,
    pub(crate) registry: AdapterRegistry,
    pub(crate) sessions: Arc<SessionStateMachine>,
    pub(crate) scheduler: Scheduler,
}

impl HealthCollector {
    pub async fn snapshot(&self) -> HealthSnapshot {
        HealthSnapshot {
            storage_error: self.storage.ping().await.err().map(|e| e.to_string()),
            knowledge_consistent: self.retriever.is_consistent(),
            indexed_chunks: self.retriever.chunk_count(),
            adapters: self.registry.availability().await,
            active_sessions: self.sessions.active_count(),
            in_flight_tasks: self.scheduler.in_flight(),
            max_concurrent_tasks: self.scheduler.max_concurrent(),
        }
    }

    pub async fn report(&self) -> HealthReport {
        HealthReporter::build(&self.snapshot().await)
    }
}
