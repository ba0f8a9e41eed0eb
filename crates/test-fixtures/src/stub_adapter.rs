use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bastion_core::errors::AdapterError;
use bastion_core::models::TriggerSet;
use bastion_core::traits::ICapabilityAdapter;
use bastion_core::{Task, TaskResult};
use serde_json::{json, Map, Value};

/// What a [`StubAdapter`] does when executed.
#[derive(Debug, Clone)]
pub enum StubOutcome {
    /// `ok` with `{"analysis": <text>}`.
    Ok(String),
    Partial(String),
    /// `error` with reason `invocation_failed`.
    Fail(String),
    Panic,
}

/// A scriptable adapter: fixed triggers, fixed outcome, optional delay.
pub struct StubAdapter {
    name: String,
    triggers: TriggerSet,
    outcome: Mutex<StubOutcome>,
    delay: Duration,
    available: bool,
    calls: AtomicUsize,
    seen: Mutex<Vec<Task>>,
}

impl StubAdapter {
    pub fn new(name: &str, triggers: TriggerSet) -> Self {
        Self {
            name: name.to_string(),
            triggers,
            outcome: Mutex::new(StubOutcome::Ok(format!("{name} analysis"))),
            delay: Duration::ZERO,
            available: true,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_outcome(self, outcome: StubOutcome) -> Self {
        *self.outcome.lock().unwrap() = outcome;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn set_outcome(&self, outcome: StubOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tasks passed to `execute`, in call order.
    pub fn seen_tasks(&self) -> Vec<Task> {
        self.seen.lock().unwrap().clone()
    }

    fn payload(text: &str) -> Map<String, Value> {
        match json!({ "analysis": text }) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

#[async_trait]
impl ICapabilityAdapter for StubAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    async fn execute(&self, task: &Task) -> TaskResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(task.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if !self.available {
            return TaskResult::failed(
                &self.name,
                &AdapterError::Unavailable {
                    adapter: self.name.clone(),
                },
            );
        }
        let outcome = self.outcome.lock().unwrap().clone();
        match outcome {
            StubOutcome::Ok(text) => TaskResult::ok(&self.name, Self::payload(&text)),
            StubOutcome::Partial(text) => TaskResult::partial(&self.name, Self::payload(&text)),
            StubOutcome::Fail(reason) => TaskResult::failed(
                &self.name,
                &AdapterError::InvocationFailed {
                    adapter: self.name.clone(),
                    reason,
                },
            ),
            StubOutcome::Panic => panic!("stub adapter {} panicked", self.name),
        }
    }
}
