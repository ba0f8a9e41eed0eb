//! Top-level Bastion configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    defaults, AdaptersConfig, EmbeddingConfig, ObservabilityConfig, RetrievalConfig,
    RouterConfig, SchedulerConfig, SessionConfig, StorageConfig,
};
use crate::errors::ConfigError;

const TIMEOUT_RANGE: &str = "must be finite, greater than 0 and at most 86400 seconds";

fn valid_timeout(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0 && secs <= defaults::MAX_TIMEOUT_SECS
}

/// Top-level configuration aggregating all sub-configs.
///
/// Built once and handed to every component at construction time.
/// Resolution order (highest priority first):
/// 1. Environment variables (`BASTION_*`)
/// 2. Config file
/// 3. Compiled defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BastionConfig {
    pub scheduler: SchedulerConfig,
    pub router: RouterConfig,
    pub session: SessionConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
    pub adapters: AdaptersConfig,
}

impl BastionConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Load a TOML file, apply `BASTION_*` overrides, and validate.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let mut config: BastionConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: std::str::FromStr>(
            lookup: &dyn Fn(&str) -> Option<String>,
            key: &str,
        ) -> Option<T> {
            lookup(key).and_then(|v| v.trim().parse::<T>().ok())
        }

        if let Some(v) = parsed(&lookup, "BASTION_MAX_CONCURRENT_TASKS") {
            self.scheduler.max_concurrent_tasks = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_ADAPTER_TIMEOUT_SECONDS") {
            self.router.adapter_timeout_seconds = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_RELEVANCE_THRESHOLD") {
            self.router.relevance_threshold = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_PHASE_TIMEOUT_SECONDS") {
            self.session.phase_timeout_seconds = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_CHUNK_SIZE") {
            self.retrieval.chunk_size = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_CHUNK_OVERLAP") {
            self.retrieval.chunk_overlap = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_SIMILARITY_THRESHOLD") {
            self.retrieval.similarity_threshold = v;
        }
        if let Some(v) = parsed(&lookup, "BASTION_MAX_RESULTS") {
            self.retrieval.max_results = v;
        }
        if let Some(v) = lookup("BASTION_DB_PATH") {
            self.storage.db_path = Some(v);
        }
        if let Some(v) = lookup("BASTION_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = Some(v);
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn fail(field: &str, message: &str) -> Result<(), ConfigError> {
            Err(ConfigError::ValidationFailed {
                field: field.to_string(),
                message: message.to_string(),
            })
        }

        if self.scheduler.max_concurrent_tasks == 0 {
            return fail("scheduler.max_concurrent_tasks", "must be at least 1");
        }
        if !valid_timeout(self.router.adapter_timeout_seconds) {
            return fail("router.adapter_timeout_seconds", TIMEOUT_RANGE);
        }
        if !(0.0..=1.0).contains(&self.router.relevance_threshold) {
            return fail("router.relevance_threshold", "must be between 0.0 and 1.0");
        }
        if self.router.fallback_adapter.trim().is_empty() {
            return fail("router.fallback_adapter", "must not be empty");
        }
        if !valid_timeout(self.session.phase_timeout_seconds) {
            return fail("session.phase_timeout_seconds", TIMEOUT_RANGE);
        }
        if self.retrieval.chunk_size == 0 {
            return fail("retrieval.chunk_size", "must be greater than 0");
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return fail("retrieval.chunk_overlap", "must be smaller than chunk_size");
        }
        if !(0.0..=1.0).contains(&self.retrieval.similarity_threshold) {
            return fail("retrieval.similarity_threshold", "must be between 0.0 and 1.0");
        }
        if self.embedding.dimensions < defaults::MIN_EMBEDDING_DIMENSIONS {
            return fail("embedding.dimensions", "must be at least 8");
        }
        match self.embedding.provider.as_str() {
            "hashed" => {}
            "http" if self.embedding.endpoint.is_some() => {}
            "http" => return fail("embedding.endpoint", "required for the http provider"),
            _ => return fail("embedding.provider", "must be \"hashed\" or \"http\""),
        }
        Ok(())
    }
}
