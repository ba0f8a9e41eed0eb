//! JSON-over-HTTP backend.
//!
//! `POST {endpoint}` with the request body, expecting a JSON object back.
//! Availability is a `GET` on the health path resolved against the endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::{Map, Value};
use tracing::debug;

use super::{into_payload, BackendError, BackendRequest, IReasoningBackend};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpBackend {
    client: Client,
    endpoint: Url,
    health_url: Url,
}

impl HttpBackend {
    pub fn new(endpoint: &str, health_path: &str) -> Result<Self, String> {
        let endpoint = Url::parse(endpoint).map_err(|e| format!("invalid endpoint: {e}"))?;
        let health_url = endpoint
            .join(health_path)
            .map_err(|e| format!("invalid health path: {e}"))?;
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| e.to_string())?;
        Ok(Self {
            client,
            endpoint,
            health_url,
        })
    }

    pub fn health_url(&self) -> &Url {
        &self.health_url
    }
}

#[async_trait]
impl IReasoningBackend for HttpBackend {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn reachable(&self) -> bool {
        let result = self
            .client
            .get(self.health_url.clone())
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;
        match result {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!(url = %self.health_url, error = %e, "health check failed");
                false
            }
        }
    }

    async fn invoke(&self, request: &BackendRequest) -> Result<Map<String, Value>, BackendError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Transport(format!("HTTP {status}: {body}")));
        }

        let value: Value = response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(into_payload(value))
    }
}
