//! Adapters that forward a task to a reasoning backend.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use bastion_core::constants::{ADAPTER_GENERAL, ADAPTER_PENTEST, ADAPTER_TOOLS, CTX_TARGET};
use bastion_core::errors::AdapterError;
use bastion_core::models::{Task, TaskResult, TriggerSet};
use bastion_core::traits::ICapabilityAdapter;

use crate::backend::{BackendRequest, IReasoningBackend};
use crate::prompts::{format_task_prompt, Prompts};
use crate::triggers;

/// A named capability over one backend. Availability is checked once, on
/// first use, and cached for the life of the adapter.
pub struct BackendAdapter {
    name: String,
    triggers: TriggerSet,
    system_prompt: String,
    backend: Arc<dyn IReasoningBackend>,
    requires_target: bool,
    available: OnceCell<bool>,
}

impl BackendAdapter {
    pub fn new(
        name: &str,
        triggers: TriggerSet,
        system_prompt: &str,
        backend: Arc<dyn IReasoningBackend>,
    ) -> Self {
        Self {
            name: name.to_string(),
            triggers,
            system_prompt: system_prompt.to_string(),
            backend,
            requires_target: false,
            available: OnceCell::new(),
        }
    }

    /// Reject tasks without a resolvable target.
    pub fn requiring_target(mut self) -> Self {
        self.requires_target = true;
        self
    }

    pub fn with_extra_triggers(mut self, extra: &[String]) -> Self {
        self.triggers.extend_terms(extra.iter().cloned());
        self
    }

    pub fn pentest_reasoning(prompts: &Prompts, backend: Arc<dyn IReasoningBackend>) -> Self {
        Self::new(
            ADAPTER_PENTEST,
            triggers::pentest_triggers(),
            prompts.pentesting_expert.prompt.trim(),
            backend,
        )
    }

    pub fn tool_execution(prompts: &Prompts, backend: Arc<dyn IReasoningBackend>) -> Self {
        Self::new(
            ADAPTER_TOOLS,
            triggers::tool_triggers(),
            prompts.security_analyst.prompt.trim(),
            backend,
        )
        .requiring_target()
    }

    pub fn general_reasoning(prompts: &Prompts, backend: Arc<dyn IReasoningBackend>) -> Self {
        Self::new(
            ADAPTER_GENERAL,
            triggers::general_triggers(),
            prompts.security_analyst.prompt.trim(),
            backend,
        )
    }

    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    fn fail(&self, err: AdapterError, started: Instant) -> TaskResult {
        debug!(adapter = %self.name, reason = err.reason(), error = %err, "adapter failed");
        TaskResult::failed(&self.name, &err).with_latency(started.elapsed())
    }
}

#[async_trait]
impl ICapabilityAdapter for BackendAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    async fn is_available(&self) -> bool {
        *self
            .available
            .get_or_init(|| async {
                let up = self.backend.reachable().await;
                info!(
                    adapter = %self.name,
                    backend = self.backend.kind(),
                    available = up,
                    "adapter availability checked"
                );
                up
            })
            .await
    }

    async fn execute(&self, task: &Task) -> TaskResult {
        let started = Instant::now();
        if !self.is_available().await {
            return self.fail(
                AdapterError::Unavailable {
                    adapter: self.name.clone(),
                },
                started,
            );
        }

        let mut context = task.context.clone();
        if self.requires_target {
            match task.target() {
                Some(target) => {
                    context.insert(CTX_TARGET.to_string(), target);
                }
                None => {
                    return self.fail(
                        AdapterError::MissingInput {
                            adapter: self.name.clone(),
                            field: CTX_TARGET.to_string(),
                        },
                        started,
                    );
                }
            }
        }

        let request = BackendRequest {
            system: self.system_prompt.clone(),
            prompt: format_task_prompt(task),
            context,
        };
        match self.backend.invoke(&request).await {
            Ok(payload) => TaskResult::ok(&self.name, payload).with_latency(started.elapsed()),
            Err(e) => self.fail(e.into_adapter_error(&self.name), started),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use serde_json::{json, Map, Value};

    use super::*;
    use crate::backend::{BackendError, DisabledBackend};
    use bastion_core::models::ResultStatus;

    /// Records requests and answers with a fixed payload.
    struct EchoBackend {
        checks: AtomicUsize,
        requests: Mutex<Vec<BackendRequest>>,
    }

    impl EchoBackend {
        fn new() -> Self {
            Self {
                checks: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl IReasoningBackend for EchoBackend {
        fn kind(&self) -> &'static str {
            "echo"
        }

        async fn reachable(&self) -> bool {
            self.checks.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn invoke(&self, request: &BackendRequest) -> Result<Map<String, Value>, BackendError> {
            self.requests.lock().unwrap().push(request.clone());
            match json!({ "analysis": "done" }) {
                Value::Object(map) => Ok(map),
                _ => Err(BackendError::Malformed("not an object".into())),
            }
        }
    }

    fn prompts() -> Prompts {
        Prompts::embedded().unwrap()
    }

    #[tokio::test]
    async fn availability_is_checked_once() {
        let backend = Arc::new(EchoBackend::new());
        let adapter = BackendAdapter::pentest_reasoning(&prompts(), backend.clone());
        assert!(adapter.is_available().await);
        assert!(adapter.is_available().await);
        adapter.execute(&Task::new("exploit it")).await;
        assert_eq!(backend.checks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unconfigured_backend_fails_fast_as_unavailable() {
        let adapter = BackendAdapter::general_reasoning(&prompts(), Arc::new(DisabledBackend));
        let result = adapter.execute(&Task::new("help")).await;
        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(result.reason(), Some("unavailable"));
    }

    #[tokio::test]
    async fn tool_execution_needs_a_target() {
        let backend = Arc::new(EchoBackend::new());
        let adapter = BackendAdapter::tool_execution(&prompts(), backend.clone());

        let result = adapter.execute(&Task::new("enumerate open ports")).await;
        assert_eq!(result.reason(), Some("missing_input"));

        let result = adapter.execute(&Task::new("run nmap against 10.1.2.3")).await;
        assert_eq!(result.status, ResultStatus::Ok);
        let sent = backend.requests.lock().unwrap().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].context.get("target").map(String::as_str), Some("10.1.2.3"));
    }

    #[tokio::test]
    async fn request_carries_prompt_and_context() {
        let backend = Arc::new(EchoBackend::new());
        let adapter = BackendAdapter::pentest_reasoning(&prompts(), backend.clone());
        let task = Task::new("exploit path?").with_context("target", "a.example");
        let result = adapter.execute(&task).await;
        assert_eq!(result.payload["analysis"], "done");

        let sent = backend.requests.lock().unwrap().clone();
        assert!(sent[0].system.contains("penetration testing"));
        assert!(sent[0].prompt.ends_with("- target: a.example"));
    }

    #[test]
    fn extra_triggers_extend_builtins() {
        let adapter = BackendAdapter::general_reasoning(&prompts(), Arc::new(DisabledBackend))
            .with_extra_triggers(&["Compliance".to_string(), "help".to_string()]);
        let terms = &adapter.declared_triggers().terms;
        assert!(terms.contains(&"compliance".to_string()));
        assert_eq!(terms.iter().filter(|t| *t == "help").count(), 1);
    }
}
