//! The knowledge adapter: answers from the knowledge base, optionally
//! summarized by an intelligence-analyst backend.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use bastion_core::constants::{ADAPTER_KNOWLEDGE, CTX_COLLECTION, CTX_QUERY};
use bastion_core::errors::AdapterError;
use bastion_core::models::{Collection, RetrievalResult, Task, TaskResult, TriggerSet};
use bastion_core::traits::ICapabilityAdapter;
use bastion_retrieval::context::build_context;
use bastion_retrieval::KnowledgeRetriever;

use crate::backend::{BackendRequest, IReasoningBackend};
use crate::prompts::Prompts;
use crate::triggers;

pub struct KnowledgeAdapter {
    triggers: TriggerSet,
    retriever: Arc<KnowledgeRetriever>,
    summarizer: Option<(String, Arc<dyn IReasoningBackend>)>,
    /// Summarizer reachability, checked once on the first summary attempt.
    summarizer_up: OnceCell<bool>,
}

impl KnowledgeAdapter {
    pub fn new(retriever: Arc<KnowledgeRetriever>) -> Self {
        Self {
            triggers: triggers::knowledge_triggers(),
            retriever,
            summarizer: None,
            summarizer_up: OnceCell::new(),
        }
    }

    /// Summarize matches through `backend` with the intelligence-analyst prompt.
    pub fn with_summarizer(
        mut self,
        prompts: &Prompts,
        backend: Arc<dyn IReasoningBackend>,
    ) -> Self {
        self.summarizer = Some((prompts.intelligence_analyst.prompt.trim().to_string(), backend));
        self
    }

    pub fn with_extra_triggers(mut self, extra: &[String]) -> Self {
        self.triggers.extend_terms(extra.iter().cloned());
        self
    }

    fn failed(&self, reason: String, started: Instant) -> TaskResult {
        TaskResult::failed(
            ADAPTER_KNOWLEDGE,
            &AdapterError::InvocationFailed {
                adapter: ADAPTER_KNOWLEDGE.to_string(),
                reason,
            },
        )
        .with_latency(started.elapsed())
    }

    /// A summary when a summarizer is configured and answers. Failures only
    /// lose the summary, never the matches.
    async fn summarize(&self, query: &str, context: &str) -> Option<Value> {
        let (system, backend) = self.summarizer.as_ref()?;
        let up = *self
            .summarizer_up
            .get_or_init(|| async {
                let up = backend.reachable().await;
                info!(backend = backend.kind(), available = up, "knowledge summarizer checked");
                up
            })
            .await;
        if !up {
            return None;
        }
        let request = BackendRequest {
            system: system.clone(),
            prompt: format!("Question: {query}\n\nKnowledge excerpts:\n{context}"),
            context: [(CTX_QUERY.to_string(), query.to_string())].into(),
        };
        match backend.invoke(&request).await {
            Ok(payload) => Some(Value::Object(payload)),
            Err(e) => {
                warn!(error = %e, "knowledge summary failed");
                None
            }
        }
    }
}

fn matches_json(result: &RetrievalResult) -> Value {
    Value::Array(
        result
            .matches
            .iter()
            .map(|m| {
                json!({
                    "source_id": m.chunk.source_id,
                    "collection": m.chunk.collection,
                    "score": m.score,
                    "offset": m.chunk.offset_in_source,
                    "text": m.chunk.text,
                    "title": m.chunk.metadata.title,
                    "origin": m.chunk.metadata.origin,
                    "tags": m.chunk.metadata.tags,
                })
            })
            .collect(),
    )
}

#[async_trait]
impl ICapabilityAdapter for KnowledgeAdapter {
    fn name(&self) -> &str {
        ADAPTER_KNOWLEDGE
    }

    fn declared_triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn execute(&self, task: &Task) -> TaskResult {
        let started = Instant::now();
        let query = task.query_text();
        let collection = match task.context_value(CTX_COLLECTION).map(str::parse::<Collection>) {
            None => None,
            Some(Ok(c)) => Some(c),
            Some(Err(e)) => return self.failed(e.to_string(), started),
        };

        let result = match self.retriever.search(&query, collection).await {
            Ok(result) => result,
            Err(e) => return self.failed(e.to_string(), started),
        };
        debug!(query = %query, matches = result.len(), "knowledge lookup");

        let context = build_context(&result, self.retriever.config().context_max_chars);
        let mut payload = Map::new();
        payload.insert("query".to_string(), Value::from(query.clone()));
        payload.insert("matches".to_string(), matches_json(&result));
        payload.insert("context".to_string(), Value::from(context.clone()));

        if result.is_empty() {
            payload.insert("note".to_string(), Value::from("no matching knowledge"));
            return TaskResult::partial(ADAPTER_KNOWLEDGE, payload).with_latency(started.elapsed());
        }
        if let Some(summary) = self.summarize(&query, &context).await {
            payload.insert("summary".to_string(), summary);
        }
        TaskResult::ok(ADAPTER_KNOWLEDGE, payload).with_latency(started.elapsed())
    }
}
