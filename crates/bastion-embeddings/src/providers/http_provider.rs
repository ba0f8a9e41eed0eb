//! OpenAI-compatible HTTP embedding provider.
//!
//! `POST {endpoint}` with `{"model", "input": [..]}`, expecting
//! `{"data": [{"embedding": [..]}, ..]}` back in input order.
//! Calls block; the retriever runs them on the blocking pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use bastion_core::errors::{BastionResult, EmbeddingError};
use bastion_core::traits::IEmbeddingProvider;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 2;

pub struct HttpEmbeddingProvider {
    endpoint: String,
    model: String,
    dimensions: usize,
    available: AtomicBool,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: String, model: String, dimensions: usize) -> Self {
        Self {
            endpoint,
            model,
            dimensions,
            available: AtomicBool::new(true),
        }
    }

    fn request_embeddings(&self, texts: &[String]) -> BastionResult<Vec<Vec<f32>>> {
        let mut last_err = None;
        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                std::thread::sleep(Duration::from_millis(100 * 2u64.pow(attempt - 1)));
                debug!(attempt, "retrying embedding request");
            }
            match self.send_request(texts) {
                Ok(vectors) => {
                    self.available.store(true, Ordering::Relaxed);
                    return Ok(vectors);
                }
                Err(e) => {
                    warn!(attempt, error = %e, "embedding request failed");
                    last_err = Some(e);
                }
            }
        }
        self.available.store(false, Ordering::Relaxed);
        Err(last_err
            .unwrap_or_else(|| EmbeddingError::InferenceFailed {
                reason: "all retries exhausted".to_string(),
            })
            .into())
    }

    fn send_request(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let failed = |reason: String| EmbeddingError::InferenceFailed { reason };

        // A blocking client owns an internal runtime, so it is built on the
        // calling (blocking) thread rather than stored on the provider.
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| failed(format!("client build: {e}")))?;

        let response = client
            .post(&self.endpoint)
            .json(&EmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .map_err(|e| failed(format!("request: {e}")))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let body: EmbedResponse = response
            .json()
            .map_err(|e| failed(format!("response body: {e}")))?;

        if body.data.len() != texts.len() {
            return Err(failed(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data
            .into_iter()
            .map(|d| {
                if d.embedding.len() == self.dimensions {
                    Ok(d.embedding)
                } else {
                    Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimensions,
                        actual: d.embedding.len(),
                    })
                }
            })
            .collect()
    }
}

impl IEmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> BastionResult<Vec<f32>> {
        let mut vectors = self.request_embeddings(&[text.to_string()])?;
        vectors.pop().ok_or_else(|| {
            EmbeddingError::InferenceFailed {
                reason: "empty response".to_string(),
            }
            .into()
        })
    }

    fn embed_batch(&self, texts: &[String]) -> BastionResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "http"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }
}
