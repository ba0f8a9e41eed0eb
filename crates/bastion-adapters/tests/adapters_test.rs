use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bastion_adapters::backend::{BackendError, BackendRequest, IReasoningBackend};
use bastion_adapters::knowledge::KnowledgeAdapter;
use bastion_adapters::prompts::Prompts;
use bastion_adapters::AdapterRegistry;
use bastion_core::config::{AdapterConfig, AdaptersConfig, BackendKind, EmbeddingConfig};
use bastion_core::constants::{ADAPTER_GENERAL, ADAPTER_KNOWLEDGE, ADAPTER_PENTEST, ADAPTER_TOOLS};
use bastion_core::errors::{BastionError, ConfigError};
use bastion_core::models::{DocumentMetadata, ResultStatus, Task};
use bastion_core::traits::{ICapabilityAdapter, IChunkStore, IEmbeddingProvider};
use bastion_embeddings::EmbeddingEngine;
use bastion_retrieval::KnowledgeRetriever;
use bastion_storage::StorageEngine;
use test_fixtures::corpus::SAMPLE_DOCUMENTS;
use test_fixtures::test_config;

async fn seeded_retriever() -> Arc<KnowledgeRetriever> {
    let config = test_config();
    let store: Arc<dyn IChunkStore> = Arc::new(StorageEngine::open_in_memory().unwrap());
    let embedder: Arc<dyn IEmbeddingProvider> = Arc::new(
        EmbeddingEngine::new(&EmbeddingConfig {
            dimensions: 256,
            ..Default::default()
        })
        .unwrap(),
    );
    let retriever = KnowledgeRetriever::open(config.retrieval, embedder, store)
        .await
        .unwrap();
    for doc in SAMPLE_DOCUMENTS {
        retriever
            .ingest_with_metadata(
                doc.source_id,
                doc.text,
                doc.collection,
                DocumentMetadata::default().with_tags(doc.tags.iter().copied()),
            )
            .await
            .unwrap();
    }
    Arc::new(retriever)
}

// ── Registry ──

#[tokio::test]
async fn default_registry_has_all_four_in_order() {
    let registry = AdapterRegistry::from_config(&AdaptersConfig::default(), Some(seeded_retriever().await))
        .unwrap();
    assert_eq!(
        registry.names(),
        vec![ADAPTER_PENTEST, ADAPTER_TOOLS, ADAPTER_GENERAL, ADAPTER_KNOWLEDGE]
    );

    let availability = registry.availability().await;
    let up: Vec<_> = availability.iter().filter(|(_, a)| *a).map(|(n, _)| n.as_str()).collect();
    assert_eq!(up, vec![ADAPTER_KNOWLEDGE]);
}

#[tokio::test]
async fn disabled_and_retrieverless_adapters_are_left_out() {
    let mut config = AdaptersConfig::default();
    config.tool_execution.enabled = false;
    let registry = AdapterRegistry::from_config(&config, None).unwrap();
    assert_eq!(registry.names(), vec![ADAPTER_PENTEST, ADAPTER_GENERAL]);
    assert!(registry.get(ADAPTER_TOOLS).is_none());
}

#[test]
fn http_backend_without_endpoint_is_a_config_error() {
    let mut config = AdaptersConfig::default();
    config.general_reasoning = AdapterConfig {
        backend: BackendKind::Http,
        ..Default::default()
    };
    match AdapterRegistry::from_config(&config, None) {
        Err(BastionError::Config(ConfigError::ValidationFailed { field, .. })) => {
            assert_eq!(field, "adapters.general_reasoning.endpoint");
        }
        Err(other) => panic!("unexpected error {other}"),
        Ok(_) => panic!("expected a config error"),
    }
}

#[tokio::test]
async fn unavailable_adapter_still_classifies_but_fails_execution() {
    let registry = AdapterRegistry::from_config(&AdaptersConfig::default(), None).unwrap();
    let pentest = registry.get(ADAPTER_PENTEST).unwrap();
    assert!(pentest.declared_triggers().terms.contains(&"exploit".to_string()));
    let result = pentest.execute(&Task::new("exploit the login form")).await;
    assert_eq!(result.status, ResultStatus::Error);
    assert_eq!(result.reason(), Some("unavailable"));
}

#[cfg(unix)]
#[tokio::test]
async fn command_backend_round_trips_through_cat() {
    let mut config = AdaptersConfig::default();
    config.tool_execution = AdapterConfig {
        backend: BackendKind::Command,
        program: Some("cat".into()),
        extra_triggers: vec!["masscan".into()],
        ..Default::default()
    };
    let registry = AdapterRegistry::from_config(&config, None).unwrap();
    let tools = registry.get(ADAPTER_TOOLS).unwrap();
    assert!(tools.is_available().await);
    assert!(tools.declared_triggers().terms.contains(&"masscan".to_string()));

    let result = tools
        .execute(&Task::new("scan ports").with_context("target", "10.9.8.7"))
        .await;
    assert_eq!(result.status, ResultStatus::Ok);
    assert_eq!(result.payload["context"]["target"], "10.9.8.7");
    assert!(result.payload["prompt"].as_str().unwrap().starts_with("scan ports"));
}

// ── Knowledge adapter ──

#[tokio::test]
async fn knowledge_adapter_returns_matches_and_context() {
    let registry = AdapterRegistry::from_config(&AdaptersConfig::default(), Some(seeded_retriever().await))
        .unwrap();
    let knowledge = registry.get(ADAPTER_KNOWLEDGE).unwrap();
    let doc = &SAMPLE_DOCUMENTS[0];

    let result = knowledge
        .execute(&Task::new("lookup").with_context("query", doc.text))
        .await;
    assert_eq!(result.status, ResultStatus::Ok);
    let matches = result.payload["matches"].as_array().unwrap();
    assert_eq!(matches[0]["source_id"], doc.source_id);
    assert_eq!(matches[0]["tags"], serde_json::json!(doc.tags));
    assert!(result.payload["context"]
        .as_str()
        .unwrap()
        .starts_with(&format!("Source: {}", doc.source_id)));
    assert!(result.payload.get("summary").is_none());
}

#[tokio::test]
async fn knowledge_adapter_honors_collection_context() {
    let registry = AdapterRegistry::from_config(&AdaptersConfig::default(), Some(seeded_retriever().await))
        .unwrap();
    let knowledge = registry.get(ADAPTER_KNOWLEDGE).unwrap();
    let doc = &SAMPLE_DOCUMENTS[0];

    let result = knowledge
        .execute(
            &Task::new("lookup")
                .with_context("query", doc.text)
                .with_context("collection", "general"),
        )
        .await;
    assert_eq!(result.status, ResultStatus::Partial);
    assert!(result.payload["matches"].as_array().unwrap().is_empty());

    let result = knowledge
        .execute(&Task::new("lookup").with_context("collection", "gossip"))
        .await;
    assert_eq!(result.status, ResultStatus::Error);
    assert_eq!(result.reason(), Some("invocation_failed"));
}

#[cfg(unix)]
#[tokio::test]
async fn knowledge_summary_comes_from_configured_backend() {
    let mut config = AdaptersConfig::default();
    config.knowledge = AdapterConfig {
        backend: BackendKind::Command,
        program: Some("cat".into()),
        ..Default::default()
    };
    let registry = AdapterRegistry::from_config(&config, Some(seeded_retriever().await)).unwrap();
    let knowledge = registry.get(ADAPTER_KNOWLEDGE).unwrap();
    let doc = &SAMPLE_DOCUMENTS[2];

    let result = knowledge
        .execute(&Task::new("lookup").with_context("query", doc.text))
        .await;
    assert_eq!(result.status, ResultStatus::Ok);
    let summary = &result.payload["summary"];
    assert!(summary["system"].as_str().unwrap().contains("threat intelligence"));
    assert!(summary["prompt"].as_str().unwrap().contains(doc.source_id));
}

// ── Summarizer ──

/// Counts reachability checks and echoes the prompt back.
struct CountingBackend {
    checks: AtomicUsize,
    up: bool,
}

#[async_trait]
impl IReasoningBackend for CountingBackend {
    fn kind(&self) -> &'static str {
        "command"
    }

    async fn reachable(&self) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.up
    }

    async fn invoke(
        &self,
        request: &BackendRequest,
    ) -> Result<serde_json::Map<String, serde_json::Value>, BackendError> {
        let mut map = serde_json::Map::new();
        map.insert("prompt".to_string(), request.prompt.clone().into());
        Ok(map)
    }
}

async fn summarizing_adapter(up: bool) -> (KnowledgeAdapter, Arc<CountingBackend>) {
    let backend = Arc::new(CountingBackend {
        checks: AtomicUsize::new(0),
        up,
    });
    let summarizer: Arc<dyn IReasoningBackend> = Arc::clone(&backend) as _;
    let adapter = KnowledgeAdapter::new(seeded_retriever().await)
        .with_summarizer(&Prompts::embedded().unwrap(), summarizer);
    (adapter, backend)
}

#[tokio::test]
async fn summarizer_availability_is_checked_once() {
    let (adapter, backend) = summarizing_adapter(true).await;
    let doc = &SAMPLE_DOCUMENTS[1];
    for _ in 0..3 {
        let result = adapter
            .execute(&Task::new("lookup").with_context("query", doc.text))
            .await;
        assert_eq!(result.status, ResultStatus::Ok);
        assert!(result.payload.get("summary").is_some());
    }
    assert_eq!(backend.checks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unreachable_summarizer_is_not_rechecked() {
    let (adapter, backend) = summarizing_adapter(false).await;
    let doc = &SAMPLE_DOCUMENTS[1];
    for _ in 0..3 {
        let result = adapter
            .execute(&Task::new("lookup").with_context("query", doc.text))
            .await;
        assert_eq!(result.status, ResultStatus::Ok);
        assert!(result.payload.get("summary").is_none());
    }
    assert_eq!(backend.checks.load(Ordering::SeqCst), 1);
}
