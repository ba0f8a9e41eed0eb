mod hashed_tfidf;
mod http_provider;

pub use hashed_tfidf::HashedTfIdfProvider;
pub use http_provider::HttpEmbeddingProvider;

use bastion_core::config::EmbeddingConfig;
use bastion_core::errors::{BastionResult, EmbeddingError};
use bastion_core::traits::IEmbeddingProvider;

/// Build the provider named in config.
pub fn create_provider(config: &EmbeddingConfig) -> BastionResult<Box<dyn IEmbeddingProvider>> {
    match config.provider.as_str() {
        "hashed" => Ok(Box::new(HashedTfIdfProvider::new(
            config.model.clone(),
            config.dimensions,
        ))),
        "http" => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| EmbeddingError::ProviderUnavailable {
                    provider: "http (no endpoint configured)".to_string(),
                })?;
            Ok(Box::new(HttpEmbeddingProvider::new(
                endpoint,
                config.model.clone(),
                config.dimensions,
            )))
        }
        other => Err(EmbeddingError::ProviderUnavailable {
            provider: other.to_string(),
        }
        .into()),
    }
}
