use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{BackendError, BackendRequest, IReasoningBackend};

/// Stands in for an adapter whose backend is not configured.
pub struct DisabledBackend;

#[async_trait]
impl IReasoningBackend for DisabledBackend {
    fn kind(&self) -> &'static str {
        "none"
    }

    async fn reachable(&self) -> bool {
        false
    }

    async fn invoke(&self, _request: &BackendRequest) -> Result<Map<String, Value>, BackendError> {
        Err(BackendError::NotConfigured)
    }
}
