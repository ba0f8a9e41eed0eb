use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bastion_adapters::triggers::{pentest_triggers, tool_triggers};
use bastion_core::constants::{ADAPTER_KNOWLEDGE, ADAPTER_PENTEST, ADAPTER_TOOLS};
use bastion_core::errors::{BastionError, BastionResult, SessionError};
use bastion_core::models::{
    AuditKind, Collection, DocumentMetadata, HealthStatus, Phase, ResultStatus, SessionStatus,
};
use bastion_core::traits::{ICapabilityAdapter, IIngestionSource, IngestionDocument};
use bastion_core::BastionConfig;
use bastion_runtime::Bastion;
use bastion_storage::StorageEngine;
use test_fixtures::corpus::SAMPLE_DOCUMENTS;
use test_fixtures::{test_config, StubAdapter};

fn target_context(target: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("target".to_string(), target.to_string())])
}

async fn with_stubs(config: BastionConfig) -> (Bastion, Arc<StubAdapter>, Arc<StubAdapter>) {
    let pentest = Arc::new(StubAdapter::new(ADAPTER_PENTEST, pentest_triggers()));
    let tools = Arc::new(StubAdapter::new(ADAPTER_TOOLS, tool_triggers()));
    let bastion = Bastion::builder(config)
        .with_adapter(pentest.clone() as Arc<dyn ICapabilityAdapter>)
        .with_adapter(tools.clone() as Arc<dyn ICapabilityAdapter>)
        .open()
        .await
        .unwrap();
    (bastion, pentest, tools)
}

/// Hands out its documents once.
struct OneShotSource {
    documents: Mutex<Option<Vec<IngestionDocument>>>,
}

#[async_trait]
impl IIngestionSource for OneShotSource {
    fn name(&self) -> &str {
        "one-shot"
    }

    async fn poll(&self) -> BastionResult<Vec<IngestionDocument>> {
        Ok(self.documents.lock().unwrap().take().unwrap_or_default())
    }
}

// ── Open ──

#[tokio::test]
async fn default_config_opens_with_every_adapter() {
    let bastion = Bastion::open(test_config()).await.unwrap();
    assert_eq!(
        bastion.adapters().names(),
        vec!["pentest_reasoning", "tool_execution", "general_reasoning", "knowledge"]
    );

    let health = bastion.health().await;
    assert_eq!(health.metrics.total_adapters, 4);
    // No backends configured: only knowledge answers.
    assert_eq!(health.metrics.available_adapters, 1);
    assert_eq!(health.overall_status, HealthStatus::Degraded);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let mut config = test_config();
    config.retrieval.chunk_overlap = config.retrieval.chunk_size;
    let err = Bastion::open(config).await.err().unwrap();
    assert!(matches!(err, BastionError::Config(_)));
}

#[tokio::test]
async fn sessions_need_an_analyst() {
    let mut config = test_config();
    config.adapters.pentest_reasoning.enabled = false;
    config.adapters.general_reasoning.enabled = false;
    let err = Bastion::open(config).await.err().unwrap();
    assert!(matches!(err, BastionError::Config(_)));
}

// ── Tasks ──

#[tokio::test]
async fn submitted_task_is_routed_and_audited() {
    let (bastion, pentest, tools) = with_stubs(test_config()).await;
    let combined = bastion
        .submit_task(
            "scan target.com for vulnerabilities",
            target_context("target.com"),
            None,
        )
        .await
        .unwrap();

    assert_eq!(combined.status, ResultStatus::Ok);
    assert_eq!(pentest.calls(), 1);
    assert_eq!(tools.calls(), 1);

    let storage = bastion.storage();
    assert_eq!(storage.audit_count(AuditKind::RoutingDecision).await.unwrap(), 1);
    assert_eq!(storage.audit_count(AuditKind::CombinedResult).await.unwrap(), 1);
    assert_eq!(storage.audit_trail(&combined.task_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn declared_type_routes_to_knowledge() {
    let (bastion, pentest, _) = with_stubs(test_config()).await;
    for doc in SAMPLE_DOCUMENTS {
        bastion
            .ingest_document(doc.source_id, doc.text, doc.collection)
            .await
            .unwrap();
    }
    let combined = bastion
        .submit_task("log4j", BTreeMap::new(), Some("intelligence_gathering"))
        .await
        .unwrap();
    let knowledge = combined.result_for(ADAPTER_KNOWLEDGE).unwrap();
    assert_ne!(knowledge.status, ResultStatus::Error);
    assert_eq!(pentest.calls(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn tasks_queue_behind_the_concurrency_cap() {
    let mut config = test_config();
    config.scheduler.max_concurrent_tasks = 1;
    let slow = Arc::new(
        StubAdapter::new(ADAPTER_PENTEST, pentest_triggers())
            .with_delay(Duration::from_millis(200)),
    );
    let bastion = Bastion::builder(config)
        .with_adapter(slow.clone() as Arc<dyn ICapabilityAdapter>)
        .open()
        .await
        .unwrap();

    let started = Instant::now();
    let (a, b) = tokio::join!(
        bastion.submit_task("exploit the login form", BTreeMap::new(), None),
        bastion.submit_task("exploit the upload form", BTreeMap::new(), None),
    );
    assert!(started.elapsed() >= Duration::from_millis(390));
    assert_eq!(a.unwrap().status, ResultStatus::Ok);
    assert_eq!(b.unwrap().status, ResultStatus::Ok);
    assert_eq!(slow.calls(), 2);
    assert_eq!(bastion.scheduler().in_flight(), 0);
}

// ── Sessions ──

#[tokio::test]
async fn session_lifecycle_through_the_facade() {
    let (bastion, pentest, _) = with_stubs(test_config()).await;
    let id = bastion.start_session("app.example.com").await.unwrap();

    let record = bastion
        .advance_session(&id, Phase::Reconnaissance, "", false)
        .await
        .unwrap();
    assert_eq!(record.phase_name, Phase::Reconnaissance);
    assert_eq!(record.output_analysis, "pentest_reasoning analysis");

    let err = bastion
        .advance_session(&id, Phase::Mitigation, "", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BastionError::Session(SessionError::PhaseOrder { .. })
    ));

    let report = bastion.complete_session(&id).await.unwrap();
    assert!(report.report.contains("app.example.com"));
    assert_eq!(bastion.session(&id).unwrap().status, SessionStatus::Completed);
    assert_eq!(pentest.calls(), 1);

    let transitions = bastion
        .storage()
        .audit_count(AuditKind::SessionTransition)
        .await
        .unwrap();
    assert_eq!(transitions, 2);
}

#[tokio::test]
async fn abort_frees_the_target() {
    let (bastion, _, _) = with_stubs(test_config()).await;
    let id = bastion.start_session("10.0.0.7").await.unwrap();
    assert!(bastion.start_session("10.0.0.7").await.is_err());

    bastion.abort_session(&id, "operator request").await.unwrap();
    let session = bastion.session(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Aborted);
    assert_eq!(session.closed_reason.as_deref(), Some("operator request"));
    bastion.start_session("10.0.0.7").await.unwrap();
}

#[tokio::test]
async fn active_sessions_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config();
    config.storage.db_path = Some(dir.path().join("bastion.db").display().to_string());

    let id = {
        let (bastion, _, _) = with_stubs(config.clone()).await;
        let id = bastion.start_session("intranet.local").await.unwrap();
        bastion
            .advance_session(&id, Phase::Reconnaissance, "map the perimeter", false)
            .await
            .unwrap();
        id
    };

    let (reopened, _, _) = with_stubs(config).await;
    let session = reopened.session(&id).unwrap();
    assert_eq!(session.status, SessionStatus::Active);
    assert_eq!(session.phase_history.len(), 1);
    assert_eq!(session.phase_history[0].input_directive, "map the perimeter");
    assert!(reopened.start_session("intranet.local").await.is_err());
}

// ── Knowledge ──

#[tokio::test]
async fn ingest_then_search_exact_text() {
    let bastion = Bastion::open(test_config()).await.unwrap();
    let chunks = bastion
        .ingest_document(
            "note-1",
            "Kerberoasting extracts service tickets for offline cracking.",
            Collection::Techniques,
        )
        .await
        .unwrap();
    assert_eq!(chunks.len(), 1);

    let result = bastion
        .search_knowledge(&chunks[0].text, None, 3, 0.5)
        .await
        .unwrap();
    assert_eq!(result.matches[0].chunk.source_id, "note-1");
    assert_eq!(result.matches[0].score, 1.0);

    let filtered = bastion
        .search_knowledge(&chunks[0].text, Some(Collection::Tools), 3, 0.0)
        .await
        .unwrap();
    assert!(filtered.matches.is_empty());

    let stats = bastion.knowledge_stats();
    assert_eq!(stats.total_chunks, 1);
}

#[tokio::test]
async fn shared_storage_is_usable_after_reset() {
    let storage = Arc::new(StorageEngine::open_in_memory().unwrap());
    let bastion = Bastion::builder(test_config())
        .with_storage(storage.clone())
        .open()
        .await
        .unwrap();
    bastion
        .ingest_document("doc", "Pass-the-hash reuses NTLM hashes.", Collection::Techniques)
        .await
        .unwrap();
    assert_eq!(storage.chunk_count().await.unwrap(), 1);

    bastion.reset_knowledge().await.unwrap();
    assert_eq!(storage.chunk_count().await.unwrap(), 0);
    assert_eq!(bastion.knowledge_stats().total_chunks, 0);
}

// ── Background jobs & shutdown ──

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_ingestion_and_shutdown() {
    let bastion = Bastion::open(test_config()).await.unwrap();
    let documents = SAMPLE_DOCUMENTS
        .iter()
        .map(|d| IngestionDocument {
            source_id: d.source_id.to_string(),
            text: d.text.to_string(),
            collection: d.collection,
            metadata: DocumentMetadata::default().with_tags(d.tags.iter().copied()),
        })
        .collect();
    let source: Arc<dyn IIngestionSource> = Arc::new(OneShotSource {
        documents: Mutex::new(Some(documents)),
    });

    assert!(bastion.start_background(vec![source]).await);
    assert!(!bastion.start_background(Vec::new()).await);

    let indexed_sources = || -> usize {
        bastion
            .knowledge_stats()
            .collections
            .values()
            .map(|c| c.sources)
            .sum()
    };
    // The first tick fires immediately.
    let deadline = Instant::now() + Duration::from_secs(5);
    while indexed_sources() < SAMPLE_DOCUMENTS.len() {
        assert!(Instant::now() < deadline, "ingestion job never finished");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(indexed_sources(), SAMPLE_DOCUMENTS.len());

    let web = bastion.search_knowledge_by_tags(&["WEB".to_string()], None);
    let ids: Vec<_> = web.iter().map(|m| m.document.source_id.as_str()).collect();
    assert_eq!(ids, vec!["gobuster-notes", "owasp-sqli"]);
    assert_eq!(bastion.list_knowledge(Some(Collection::Tools)).len(), 2);

    bastion.shutdown().await;
    assert!(!bastion.background_running().await);
    let err = bastion
        .submit_task("exploit it", BTreeMap::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, BastionError::ShuttingDown));
}
