//! [`Bastion`]: owns every engine and exposes the external operations.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn, Instrument};

use bastion_adapters::AdapterRegistry;
use bastion_core::config::BastionConfig;
use bastion_core::constants::{ADAPTER_GENERAL, ADAPTER_PENTEST};
use bastion_core::errors::{BastionResult, ConfigError};
use bastion_core::models::{
    Collection, CombinedResult, DocumentChunk, DocumentMetadata, FinalReport, HealthReport,
    KnowledgeStats, Phase, PhaseRecord, RetrievalQuery, RetrievalResult, Session, SessionStatus,
    SourceDocument, TagMatch, Task,
};
use bastion_core::traits::{
    IAuditSink, ICapabilityAdapter, IChunkStore, IEmbeddingProvider, IIngestionSource,
    ISessionStore,
};
use bastion_embeddings::EmbeddingEngine;
use bastion_observability::tracing_setup::events;
use bastion_observability::{init_tracing, retrieval_span, routing_span, session_span};
use bastion_retrieval::KnowledgeRetriever;
use bastion_router::Router;
use bastion_session::SessionStateMachine;
use bastion_storage::StorageEngine;

use crate::health::HealthCollector;
use crate::jobs::{BackgroundJobs, JobIntervals};
use crate::scheduler::Scheduler;

/// Assembles a [`Bastion`]. Everything not supplied is built from config.
pub struct BastionBuilder {
    config: BastionConfig,
    storage: Option<Arc<StorageEngine>>,
    embedder: Option<Arc<dyn IEmbeddingProvider>>,
    adapters: Vec<Arc<dyn ICapabilityAdapter>>,
}

impl BastionBuilder {
    pub fn new(config: BastionConfig) -> Self {
        Self {
            config,
            storage: None,
            embedder: None,
            adapters: Vec::new(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<StorageEngine>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn IEmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Register an adapter after the configured ones, replacing any
    /// configured adapter of the same name.
    pub fn with_adapter(mut self, adapter: Arc<dyn ICapabilityAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub async fn open(self) -> BastionResult<Bastion> {
        let config = self.config;
        config.validate()?;
        // No-op when the host already installed a subscriber.
        init_tracing(&config.observability);

        let storage = match self.storage {
            Some(storage) => storage,
            None => Arc::new(StorageEngine::from_config(&config.storage)?),
        };
        let embedder: Arc<dyn IEmbeddingProvider> = match self.embedder {
            Some(embedder) => embedder,
            None => Arc::new(EmbeddingEngine::new(&config.embedding)?),
        };

        let chunk_store: Arc<dyn IChunkStore> = storage.clone();
        let retriever = Arc::new(
            KnowledgeRetriever::open(config.retrieval.clone(), embedder, chunk_store).await?,
        );
        if let Some(stored) = retriever.stale_fingerprint() {
            events::embedding_inconsistency(
                &stored.to_string(),
                &retriever.fingerprint().to_string(),
            );
        }

        let mut registry =
            AdapterRegistry::from_config(&config.adapters, Some(retriever.clone()))?;
        for adapter in self.adapters {
            registry.register(adapter);
        }

        let analyst = registry
            .get(ADAPTER_PENTEST)
            .or_else(|| registry.get(ADAPTER_GENERAL))
            .ok_or_else(|| ConfigError::ValidationFailed {
                field: "adapters".to_string(),
                message: format!(
                    "session analysis needs {ADAPTER_PENTEST} or {ADAPTER_GENERAL} enabled"
                ),
            })?;

        let audit: Arc<dyn IAuditSink> = storage.clone();
        let session_store: Arc<dyn ISessionStore> = storage.clone();
        let router = Router::new(config.router.clone(), registry.adapters().to_vec())
            .with_audit(audit.clone());
        let sessions = Arc::new(
            SessionStateMachine::new(config.session.clone(), analyst)
                .with_store(session_store)
                .with_audit(audit),
        );
        let restored = sessions.restore().await?;
        let scheduler = Scheduler::new(config.scheduler.max_concurrent_tasks);

        info!(
            adapters = ?registry.names(),
            chunks = retriever.chunk_count(),
            restored_sessions = restored,
            max_concurrent = scheduler.max_concurrent(),
            "bastion opened"
        );

        Ok(Bastion {
            config,
            storage,
            retriever,
            registry,
            router,
            sessions,
            scheduler,
            jobs: Mutex::new(None),
        })
    }
}

/// The orchestration engine. Every method takes `&self`; share it behind an
/// `Arc` across request handlers.
pub struct Bastion {
    config: BastionConfig,
    storage: Arc<StorageEngine>,
    retriever: Arc<KnowledgeRetriever>,
    registry: AdapterRegistry,
    router: Router,
    sessions: Arc<SessionStateMachine>,
    scheduler: Scheduler,
    jobs: Mutex<Option<BackgroundJobs>>,
}

impl Bastion {
    /// Open with everything built from `config`.
    pub async fn open(config: BastionConfig) -> BastionResult<Self> {
        BastionBuilder::new(config).open().await
    }

    pub fn builder(config: BastionConfig) -> BastionBuilder {
        BastionBuilder::new(config)
    }

    pub fn config(&self) -> &BastionConfig {
        &self.config
    }

    pub fn storage(&self) -> &Arc<StorageEngine> {
        &self.storage
    }

    pub fn adapters(&self) -> &AdapterRegistry {
        &self.registry
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    // ── Tasks ──

    /// Classify, fan out, and merge. Waits for a scheduler slot first.
    pub async fn submit_task(
        &self,
        raw_text: &str,
        context: BTreeMap<String, String>,
        declared_type: Option<&str>,
    ) -> BastionResult<CombinedResult> {
        let mut task = Task::new(raw_text).with_context_map(context);
        if let Some(declared) = declared_type {
            task = task.with_declared_type(declared);
        }
        let span = routing_span!(task.id);
        let combined = self
            .scheduler
            .run(self.router.route(task))
            .instrument(span)
            .await?;

        for result in &combined.results {
            events::adapter_failed(&combined.task_id, result);
        }
        events::task_routed(&combined);
        Ok(combined)
    }

    // ── Sessions ──

    /// Returns the new session id.
    pub async fn start_session(&self, target: &str) -> BastionResult<String> {
        let session = self.sessions.start(target).await?;
        events::session_transition(
            &session.session_id,
            &session.target_descriptor,
            session.status,
            "started",
        );
        Ok(session.session_id)
    }

    pub async fn advance_session(
        &self,
        session_id: &str,
        phase: Phase,
        directive: &str,
        skip_allowed: bool,
    ) -> BastionResult<PhaseRecord> {
        let span = session_span!(session_id, "advance");
        let outcome = self
            .scheduler
            .run(self.sessions.advance_phase(session_id, phase, directive, skip_allowed))
            .instrument(span)
            .await?;

        match &outcome {
            Ok(record) => events::session_transition(
                session_id,
                &self.target_of(session_id),
                self.status_of(session_id),
                record.phase_name.as_str(),
            ),
            Err(e) => {
                // A phase timeout closes the session.
                if let Some(session) = self.sessions.get(session_id) {
                    if session.status.is_terminal() {
                        events::session_transition(
                            session_id,
                            &session.target_descriptor,
                            session.status,
                            &e.to_string(),
                        );
                    }
                }
            }
        }
        outcome
    }

    pub async fn complete_session(&self, session_id: &str) -> BastionResult<FinalReport> {
        let report = self
            .sessions
            .complete(session_id)
            .instrument(session_span!(session_id, "complete"))
            .await?;
        events::session_transition(
            session_id,
            &report.target,
            self.status_of(session_id),
            "completed",
        );
        Ok(report)
    }

    pub async fn abort_session(&self, session_id: &str, reason: &str) -> BastionResult<()> {
        let session = self
            .sessions
            .abort(session_id, reason)
            .instrument(session_span!(session_id, "abort"))
            .await?;
        events::session_transition(
            &session.session_id,
            &session.target_descriptor,
            session.status,
            reason,
        );
        Ok(())
    }

    pub fn session(&self, session_id: &str) -> BastionResult<Session> {
        self.sessions.session(session_id)
    }

    fn target_of(&self, session_id: &str) -> String {
        self.sessions
            .get(session_id)
            .map(|s| s.target_descriptor)
            .unwrap_or_default()
    }

    fn status_of(&self, session_id: &str) -> SessionStatus {
        self.sessions
            .get(session_id)
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Active)
    }

    // ── Knowledge ──

    pub async fn ingest_document(
        &self,
        source_id: &str,
        text: &str,
        collection: Collection,
    ) -> BastionResult<Vec<DocumentChunk>> {
        self.ingest_document_with_metadata(source_id, text, collection, DocumentMetadata::default())
            .await
    }

    pub async fn ingest_document_with_metadata(
        &self,
        source_id: &str,
        text: &str,
        collection: Collection,
        metadata: DocumentMetadata,
    ) -> BastionResult<Vec<DocumentChunk>> {
        let chunks = self
            .retriever
            .ingest_with_metadata(source_id, text, collection, metadata)
            .instrument(retrieval_span!("ingest", source_id))
            .await?;
        events::document_ingested(source_id, collection.as_str(), chunks.len());
        Ok(chunks)
    }

    pub async fn search_knowledge(
        &self,
        query_text: &str,
        collection: Option<Collection>,
        top_k: usize,
        similarity_floor: f64,
    ) -> BastionResult<RetrievalResult> {
        let mut query = RetrievalQuery::new(query_text, top_k, similarity_floor);
        query.collection_filter = collection;
        self.retriever
            .query(&query)
            .instrument(retrieval_span!("query", query_text))
            .await
    }

    /// Indexed sources in `collection`, or all of them.
    pub fn list_knowledge(&self, collection: Option<Collection>) -> Vec<SourceDocument> {
        self.retriever.list_sources(collection)
    }

    pub fn search_knowledge_by_tags(
        &self,
        tags: &[String],
        collection: Option<Collection>,
    ) -> Vec<TagMatch> {
        self.retriever.search_by_tags(tags, collection)
    }

    pub fn knowledge_stats(&self) -> KnowledgeStats {
        self.retriever.stats()
    }

    /// Drop every chunk and adopt the current embedding function.
    pub async fn reset_knowledge(&self) -> BastionResult<()> {
        self.retriever.reset_index().await
    }

    // ── Health & lifecycle ──

    fn health_collector(&self) -> HealthCollector {
        HealthCollector {
            storage: Arc::clone(&self.storage),
            retriever: Arc::clone(&self.retriever),
            registry: self.registry.clone(),
            sessions: Arc::clone(&self.sessions),
            scheduler: self.scheduler.clone(),
        }
    }

    pub async fn health(&self) -> HealthReport {
        self.health_collector().report().await
    }

    /// Start the interval jobs. Returns `false` when they are already running.
    pub async fn start_background(&self, sources: Vec<Arc<dyn IIngestionSource>>) -> bool {
        let mut jobs = self.jobs.lock().await;
        if jobs.is_some() {
            warn!("background jobs already running");
            return false;
        }
        *jobs = Some(BackgroundJobs::start(
            JobIntervals::from(&self.config.scheduler),
            sources,
            Arc::clone(&self.retriever),
            Arc::clone(&self.sessions),
            self.health_collector(),
        ));
        true
    }

    pub async fn background_running(&self) -> bool {
        self.jobs.lock().await.is_some()
    }

    /// Stop background jobs and refuse new tasks. In-flight tasks finish.
    pub async fn shutdown(&self) {
        if let Some(jobs) = self.jobs.lock().await.take() {
            jobs.shutdown().await;
        }
        self.scheduler.close();
        info!("bastion shut down");
    }
}
