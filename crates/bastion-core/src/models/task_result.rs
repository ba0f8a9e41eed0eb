use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::PAYLOAD_REASON;
use crate::errors::AdapterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Ok,
    Partial,
    Error,
}

impl ResultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Partial => "partial",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome of one adapter invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub source_adapter: String,
    pub status: ResultStatus,
    pub payload: Map<String, Value>,
    #[serde(with = "duration_millis")]
    pub latency: Duration,
}

impl TaskResult {
    pub fn ok(adapter: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            source_adapter: adapter.into(),
            status: ResultStatus::Ok,
            payload,
            latency: Duration::ZERO,
        }
    }

    pub fn partial(adapter: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            status: ResultStatus::Partial,
            ..Self::ok(adapter, payload)
        }
    }

    /// An error result carrying `{"reason": <reason>, "detail": <message>}`.
    pub fn failed(adapter: impl Into<String>, err: &AdapterError) -> Self {
        let mut payload = Map::new();
        payload.insert(PAYLOAD_REASON.to_string(), Value::from(err.reason()));
        payload.insert(
            crate::constants::PAYLOAD_DETAIL.to_string(),
            Value::from(err.to_string()),
        );
        Self {
            source_adapter: adapter.into(),
            status: ResultStatus::Error,
            payload,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn reason(&self) -> Option<&str> {
        self.payload.get(PAYLOAD_REASON).and_then(Value::as_str)
    }

    pub fn succeeded(&self) -> bool {
        self.status != ResultStatus::Error
    }
}

/// Every adapter result for one task, merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub task_id: String,
    pub task_type: String,
    pub status: ResultStatus,
    pub results: Vec<TaskResult>,
    pub summary: String,
    pub completed_at: DateTime<Utc>,
}

impl CombinedResult {
    pub fn result_for(&self, adapter: &str) -> Option<&TaskResult> {
        self.results.iter().find(|r| r.source_adapter == adapter)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
