//! Router: classify, fan out, merge.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use bastion_core::config::RouterConfig;
use bastion_core::constants::CATEGORY_GENERAL;
use bastion_core::errors::AdapterError;
use bastion_core::models::{
    AuditKind, AuditRecord, CombinedResult, RoutingDecision, Task, TaskResult,
};
use bastion_core::traits::{IAuditSink, ICapabilityAdapter};

use crate::classifier::classify;
use crate::merge::merge_results;

pub struct Router {
    config: RouterConfig,
    adapters: Vec<Arc<dyn ICapabilityAdapter>>,
    audit: Option<Arc<dyn IAuditSink>>,
}

impl Router {
    /// `adapters` in registration order, which breaks classification ties.
    pub fn new(config: RouterConfig, adapters: Vec<Arc<dyn ICapabilityAdapter>>) -> Self {
        Self {
            config,
            adapters,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: Arc<dyn IAuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn adapters(&self) -> &[Arc<dyn ICapabilityAdapter>] {
        &self.adapters
    }

    pub fn classify(&self, task: &Task) -> RoutingDecision {
        classify(task, &self.adapters, &self.config)
    }

    /// Route one task. Never fails: adapter problems land in the results.
    pub async fn route(&self, task: Task) -> CombinedResult {
        let started = Instant::now();
        let decision = self.classify(&task);
        self.audit(AuditRecord::new(
            AuditKind::RoutingDecision,
            &task.id,
            serde_json::to_value(&decision).unwrap_or_else(|e| json!({ "error": e.to_string() })),
        ))
        .await;
        if decision.fallback_used {
            debug!(
                task_id = %task.id,
                fallback = %self.config.fallback_adapter,
                "no adapter cleared the threshold"
            );
        }

        let task_type = self.task_type(&decision);
        let results = if decision.selections.is_empty() {
            let name = &self.config.fallback_adapter;
            vec![TaskResult::failed(
                name.clone(),
                &AdapterError::NoAdapter { name: name.clone() },
            )]
        } else {
            self.dispatch(&task, &decision).await
        };

        let combined = merge_results(&task.id, &task_type, results);
        self.audit(AuditRecord::new(
            AuditKind::CombinedResult,
            &task.id,
            json!({
                "task_type": combined.task_type,
                "status": combined.status,
                "summary": combined.summary,
            }),
        ))
        .await;

        debug!(
            task_id = %task.id,
            task_type = %combined.task_type,
            adapters = ?decision.adapter_names(),
            status = %combined.status,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "task routed"
        );
        combined
    }

    fn task_type(&self, decision: &RoutingDecision) -> String {
        if decision.fallback_used {
            return CATEGORY_GENERAL.to_string();
        }
        decision
            .selections
            .first()
            .and_then(|top| {
                self.adapters
                    .iter()
                    .find(|a| a.name() == top.adapter_name)
                    .map(|a| {
                        a.declared_triggers()
                            .primary_category()
                            .unwrap_or(a.name())
                            .to_string()
                    })
            })
            .unwrap_or_else(|| CATEGORY_GENERAL.to_string())
    }

    /// One tokio task per selected adapter, each under the adapter deadline.
    /// Results come back in selection order.
    async fn dispatch(&self, task: &Task, decision: &RoutingDecision) -> Vec<TaskResult> {
        let timeout = self.config.adapter_timeout();
        let timeout_secs = self.config.adapter_timeout_seconds;
        let shared = Arc::new(task.clone());

        let selected: Vec<Arc<dyn ICapabilityAdapter>> = decision
            .selections
            .iter()
            .filter_map(|s| self.adapters.iter().find(|a| a.name() == s.adapter_name).cloned())
            .collect();

        let mut branches = JoinSet::new();
        for (slot, adapter) in selected.iter().enumerate() {
            let adapter = Arc::clone(adapter);
            let task = Arc::clone(&shared);
            branches.spawn(async move {
                let started = Instant::now();
                let result = match tokio::time::timeout(timeout, adapter.execute(&task)).await {
                    Ok(result) => result,
                    Err(_) => TaskResult::failed(
                        adapter.name(),
                        &AdapterError::Timeout {
                            adapter: adapter.name().to_string(),
                            timeout_secs,
                        },
                    ),
                };
                (slot, result.with_latency(started.elapsed()))
            });
        }

        let mut slots: Vec<Option<TaskResult>> = vec![None; selected.len()];
        while let Some(joined) = branches.join_next().await {
            match joined {
                Ok((slot, result)) => {
                    if let Some(reason) = result.reason() {
                        debug!(
                            task_id = %task.id,
                            adapter = %result.source_adapter,
                            reason,
                            "adapter branch failed"
                        );
                    }
                    slots[slot] = Some(result);
                }
                Err(e) => warn!(task_id = %task.id, error = %e, "adapter branch did not complete"),
            }
        }

        // A branch that never reported back panicked.
        slots
            .into_iter()
            .zip(&selected)
            .map(|(result, adapter)| {
                result.unwrap_or_else(|| {
                    TaskResult::failed(
                        adapter.name(),
                        &AdapterError::Panicked {
                            adapter: adapter.name().to_string(),
                        },
                    )
                })
            })
            .collect()
    }

    async fn audit(&self, record: AuditRecord) {
        if let Some(sink) = &self.audit {
            if let Err(e) = sink.record(record).await {
                warn!(error = %e, "routing audit write failed");
            }
        }
    }
}
