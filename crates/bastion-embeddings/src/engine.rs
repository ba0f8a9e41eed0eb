//! EmbeddingEngine: the provider plus its L1 cache and fingerprint.

use bastion_core::config::EmbeddingConfig;
use bastion_core::errors::{BastionResult, EmbeddingError};
use bastion_core::models::EmbeddingFingerprint;
use bastion_core::traits::IEmbeddingProvider;
use tracing::{debug, info};

use crate::cache::L1MemoryCache;
use crate::providers;

/// Shared by every ingest and query. All methods take `&self`.
pub struct EmbeddingEngine {
    provider: Box<dyn IEmbeddingProvider>,
    cache: L1MemoryCache,
    fingerprint: EmbeddingFingerprint,
}

impl EmbeddingEngine {
    pub fn new(config: &EmbeddingConfig) -> BastionResult<Self> {
        let provider = providers::create_provider(config)?;
        Ok(Self::with_provider(provider, config.l1_cache_size))
    }

    /// Wrap an already-built provider.
    pub fn with_provider(provider: Box<dyn IEmbeddingProvider>, cache_size: u64) -> Self {
        let fingerprint =
            EmbeddingFingerprint::new(provider.name(), provider.model(), provider.dimensions());
        info!(
            provider = provider.name(),
            model = provider.model(),
            dims = provider.dimensions(),
            "EmbeddingEngine initialized"
        );
        Self {
            provider,
            cache: L1MemoryCache::new(cache_size),
            fingerprint,
        }
    }

    pub fn fingerprint(&self) -> &EmbeddingFingerprint {
        &self.fingerprint
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn check_dims(&self, v: &[f32]) -> BastionResult<()> {
        if v.len() != self.provider.dimensions() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.provider.dimensions(),
                actual: v.len(),
            }
            .into());
        }
        Ok(())
    }
}

impl IEmbeddingProvider for EmbeddingEngine {
    fn embed(&self, text: &str) -> BastionResult<Vec<f32>> {
        let key = L1MemoryCache::key_for(text);
        if let Some(hit) = self.cache.get(&key) {
            debug!(hash = %key, "embedding cache hit");
            return Ok(hit);
        }
        let embedding = self.provider.embed(text)?;
        self.check_dims(&embedding)?;
        self.cache.insert(key, embedding.clone());
        Ok(embedding)
    }

    /// Only cache misses reach the provider, in one batch call.
    fn embed_batch(&self, texts: &[String]) -> BastionResult<Vec<Vec<f32>>> {
        let keys: Vec<String> = texts.iter().map(|t| L1MemoryCache::key_for(t)).collect();
        let mut out: Vec<Option<Vec<f32>>> = keys.iter().map(|k| self.cache.get(k)).collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| out[i].is_none()).collect();
        if !missing.is_empty() {
            let batch: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let embedded = self.provider.embed_batch(&batch)?;
            if embedded.len() != batch.len() {
                return Err(EmbeddingError::InferenceFailed {
                    reason: format!(
                        "provider returned {} vectors for {} texts",
                        embedded.len(),
                        batch.len()
                    ),
                }
                .into());
            }
            for (&i, vector) in missing.iter().zip(embedded) {
                self.check_dims(&vector)?;
                self.cache.insert(keys[i].clone(), vector.clone());
                out[i] = Some(vector);
            }
        }

        debug!(
            total = texts.len(),
            misses = missing.len(),
            "embedded batch"
        );
        Ok(out.into_iter().flatten().collect())
    }

    fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    fn name(&self) -> &str {
        self.provider.name()
    }

    fn model(&self) -> &str {
        self.provider.model()
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }
}
