use serde::{Deserialize, Serialize};

/// Identifies the embedding function that produced a set of vectors.
/// Vectors with different fingerprints are never compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingFingerprint {
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub digest: String,
}

impl EmbeddingFingerprint {
    pub fn new(provider: &str, model: &str, dimensions: usize) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(provider.as_bytes());
        hasher.update(&[0]);
        hasher.update(model.as_bytes());
        hasher.update(&[0]);
        hasher.update(&(dimensions as u64).to_le_bytes());
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            dimensions,
            digest: hasher.finalize().to_hex().to_string(),
        }
    }
}

impl std::fmt::Display for EmbeddingFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}@{} ({})",
            self.provider,
            self.model,
            self.dimensions,
            &self.digest[..self.digest.len().min(12)]
        )
    }
}
