use crate::errors::BastionResult;

/// Embedding generation provider.
pub trait IEmbeddingProvider: Send + Sync {
    /// Embed a single text, returning a vector of floats.
    fn embed(&self, text: &str) -> BastionResult<Vec<f32>>;

    /// Embed a batch of texts.
    fn embed_batch(&self, texts: &[String]) -> BastionResult<Vec<Vec<f32>>>;

    /// The dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;

    /// Provider type name, part of the embedding fingerprint.
    fn name(&self) -> &str;

    /// Model identifier, part of the embedding fingerprint.
    fn model(&self) -> &str;

    /// Whether this provider is currently available.
    fn is_available(&self) -> bool;
}
