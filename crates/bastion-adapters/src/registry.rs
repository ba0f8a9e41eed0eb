//! AdapterRegistry: the adapters a router can dispatch to, in registration order.

use std::sync::Arc;

use tracing::info;

use bastion_core::config::{AdapterConfig, AdaptersConfig, BackendKind};
use bastion_core::constants::{ADAPTER_GENERAL, ADAPTER_KNOWLEDGE, ADAPTER_PENTEST, ADAPTER_TOOLS};
use bastion_core::errors::BastionResult;
use bastion_core::traits::ICapabilityAdapter;
use bastion_retrieval::KnowledgeRetriever;

use crate::backend::{backend_from_config, IReasoningBackend};
use crate::backend_adapter::BackendAdapter;
use crate::knowledge::KnowledgeAdapter;
use crate::prompts::Prompts;

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn ICapabilityAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the built-in adapters. Disabled adapters are left out; the
    /// knowledge adapter needs a retriever.
    pub fn from_config(
        config: &AdaptersConfig,
        retriever: Option<Arc<KnowledgeRetriever>>,
    ) -> BastionResult<Self> {
        let prompts = Prompts::embedded()?;
        let mut registry = Self::new();

        type Build = fn(&Prompts, Arc<dyn IReasoningBackend>) -> BackendAdapter;
        let backed: [(&str, &AdapterConfig, Build); 3] = [
            (ADAPTER_PENTEST, &config.pentest_reasoning, BackendAdapter::pentest_reasoning),
            (ADAPTER_TOOLS, &config.tool_execution, BackendAdapter::tool_execution),
            (ADAPTER_GENERAL, &config.general_reasoning, BackendAdapter::general_reasoning),
        ];
        for (name, adapter_config, build) in backed {
            if !adapter_config.enabled {
                continue;
            }
            let backend = backend_from_config(name, adapter_config)?;
            let adapter =
                build(&prompts, backend).with_extra_triggers(&adapter_config.extra_triggers);
            registry.register(Arc::new(adapter));
        }

        if config.knowledge.enabled {
            if let Some(retriever) = retriever {
                let mut adapter = KnowledgeAdapter::new(retriever)
                    .with_extra_triggers(&config.knowledge.extra_triggers);
                if config.knowledge.backend != BackendKind::None {
                    let backend = backend_from_config(ADAPTER_KNOWLEDGE, &config.knowledge)?;
                    adapter = adapter.with_summarizer(&prompts, backend);
                }
                registry.register(Arc::new(adapter));
            }
        }

        info!(adapters = ?registry.names(), "adapter registry built");
        Ok(registry)
    }

    /// Add an adapter, replacing any with the same name in place.
    pub fn register(&mut self, adapter: Arc<dyn ICapabilityAdapter>) {
        match self.adapters.iter().position(|a| a.name() == adapter.name()) {
            Some(i) => self.adapters[i] = adapter,
            None => self.adapters.push(adapter),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ICapabilityAdapter>> {
        self.adapters.iter().find(|a| a.name() == name).cloned()
    }

    pub fn adapters(&self) -> &[Arc<dyn ICapabilityAdapter>] {
        &self.adapters
    }

    pub fn names(&self) -> Vec<&str> {
        self.adapters.iter().map(|a| a.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// `(name, available)` for every adapter, checking any not yet checked.
    pub async fn availability(&self) -> Vec<(String, bool)> {
        let mut out = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            out.push((adapter.name().to_string(), adapter.is_available().await));
        }
        out
    }
}
