//! Reasoning backends: the external engines adapters delegate to.

mod command;
mod disabled;
mod http;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use bastion_core::config::{AdapterConfig, BackendKind};
use bastion_core::errors::{AdapterError, ConfigError};

pub use command::CommandBackend;
pub use disabled::DisabledBackend;
pub use http::HttpBackend;

/// What every backend receives.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendRequest {
    pub system: String,
    pub prompt: String,
    pub context: BTreeMap<String, String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("no backend configured")]
    NotConfigured,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("backend exited with {code:?}: {stderr}")]
    Exit { code: Option<i32>, stderr: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl BackendError {
    pub fn into_adapter_error(self, adapter: &str) -> AdapterError {
        match self {
            Self::NotConfigured => AdapterError::Unavailable {
                adapter: adapter.to_string(),
            },
            other => AdapterError::InvocationFailed {
                adapter: adapter.to_string(),
                reason: other.to_string(),
            },
        }
    }
}

/// An opaque external reasoning engine.
#[async_trait]
pub trait IReasoningBackend: Send + Sync {
    /// `http`, `command`, or `none`.
    fn kind(&self) -> &'static str;

    /// Whether the engine can be reached right now.
    async fn reachable(&self) -> bool;

    async fn invoke(&self, request: &BackendRequest) -> Result<Map<String, Value>, BackendError>;
}

/// Build the backend an adapter config describes.
pub fn backend_from_config(
    name: &str,
    config: &AdapterConfig,
) -> Result<Arc<dyn IReasoningBackend>, ConfigError> {
    let missing = |field: &str| ConfigError::ValidationFailed {
        field: format!("adapters.{name}.{field}"),
        message: "required for this backend".to_string(),
    };
    let backend: Arc<dyn IReasoningBackend> = match config.backend {
        BackendKind::Http => {
            let endpoint = config.endpoint.as_deref().ok_or_else(|| missing("endpoint"))?;
            Arc::new(HttpBackend::new(endpoint, &config.health_path).map_err(|message| {
                ConfigError::ValidationFailed {
                    field: format!("adapters.{name}.endpoint"),
                    message,
                }
            })?)
        }
        BackendKind::Command => {
            let program = config.program.as_deref().ok_or_else(|| missing("program"))?;
            Arc::new(CommandBackend::new(program, config.args.clone()))
        }
        BackendKind::None => Arc::new(DisabledBackend),
    };
    Ok(backend)
}

/// Objects pass through; any other JSON value is wrapped as `{"output": v}`.
pub(crate) fn into_payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("output".to_string(), other);
            map
        }
    }
}
