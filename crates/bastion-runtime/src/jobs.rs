//! Interval jobs: ingestion polling, health checks, and session cleanup.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use bastion_core::config::SchedulerConfig;
use bastion_core::models::HealthStatus;
use bastion_core::traits::IIngestionSource;
use bastion_observability::tracing_setup::events;
use bastion_retrieval::KnowledgeRetriever;
use bastion_session::SessionStateMachine;

use crate::health::HealthCollector;

#[derive(Debug, Clone, Copy)]
pub struct JobIntervals {
    pub ingestion: Duration,
    pub health: Duration,
    pub cleanup: Duration,
}

impl From<&SchedulerConfig> for JobIntervals {
    fn from(config: &SchedulerConfig) -> Self {
        Self {
            ingestion: Duration::from_secs(config.ingestion_interval_secs.max(1)),
            health: Duration::from_secs(config.health_interval_secs.max(1)),
            cleanup: Duration::from_secs(config.cleanup_interval_secs.max(1)),
        }
    }
}

/// Running interval jobs. Dropping without [`shutdown`](Self::shutdown)
/// leaves them running until the runtime stops.
pub struct BackgroundJobs {
    shutdown: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundJobs {
    pub fn start(
        intervals: JobIntervals,
        sources: Vec<Arc<dyn IIngestionSource>>,
        retriever: Arc<KnowledgeRetriever>,
        sessions: Arc<SessionStateMachine>,
        collector: HealthCollector,
    ) -> Self {
        let (shutdown, rx) = watch::channel(false);
        let mut handles = Vec::with_capacity(3);

        if !sources.is_empty() {
            let sources = Arc::new(sources);
            handles.push(spawn_interval("ingestion", intervals.ingestion, rx.clone(), move || {
                let sources = Arc::clone(&sources);
                let retriever = Arc::clone(&retriever);
                async move {
                    poll_sources(&sources, &retriever).await;
                }
            }));
        }

        handles.push(spawn_interval("health", intervals.health, rx.clone(), move || {
            let collector = collector.clone();
            async move {
                let report = collector.report().await;
                if report.overall_status == HealthStatus::Healthy {
                    info!(metrics = ?report.metrics, "health check: healthy");
                } else {
                    let failing: Vec<String> = report
                        .subsystems
                        .iter()
                        .filter(|s| s.status != HealthStatus::Healthy)
                        .map(|s| format!("{}: {}", s.name, s.message.as_deref().unwrap_or("-")))
                        .collect();
                    warn!(status = ?report.overall_status, ?failing, "health check");
                }
            }
        }));

        handles.push(spawn_interval("cleanup", intervals.cleanup, rx, move || {
            let sessions = Arc::clone(&sessions);
            async move {
                let report = sessions.cleanup_stale().await;
                if !report.is_empty() {
                    info!(
                        aborted = report.aborted.len(),
                        evicted = report.evicted.len(),
                        "stale sessions cleaned"
                    );
                }
            }
        }));

        info!(jobs = handles.len(), "background jobs started");
        Self { shutdown, handles }
    }

    pub fn job_count(&self) -> usize {
        self.handles.len()
    }

    /// Signal every job and wait for it to exit. A job mid-run finishes that
    /// run first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "background job ended abnormally");
            }
        }
        info!("background jobs stopped");
    }
}

/// Ingest every document each source yields. Failures are logged per
/// document; one bad source does not stop the others.
pub async fn poll_sources(
    sources: &[Arc<dyn IIngestionSource>],
    retriever: &KnowledgeRetriever,
) -> usize {
    let mut ingested = 0;
    for source in sources {
        let documents = match source.poll().await {
            Ok(documents) => documents,
            Err(e) => {
                warn!(source = source.name(), error = %e, "ingestion poll failed");
                continue;
            }
        };
        for doc in documents {
            let ingest = retriever.ingest_with_metadata(
                &doc.source_id,
                &doc.text,
                doc.collection,
                doc.metadata.clone(),
            );
            match ingest.await {
                Ok(chunks) => {
                    let collection = doc.collection.as_str();
                    events::document_ingested(&doc.source_id, collection, chunks.len());
                    ingested += 1;
                }
                Err(e) => warn!(
                    source = source.name(),
                    source_id = %doc.source_id,
                    error = %e,
                    "document ingestion failed"
                ),
            }
        }
    }
    debug!(sources = sources.len(), ingested, "ingestion poll complete");
    ingested
}

fn spawn_interval<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    job: F,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!(job = name, "job stopping");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    debug!(job = name, "job tick");
                    job().await;
                }
            }
        }
    })
}
