//! # bastion-adapters
//!
//! The four built-in capability adapters and the backends they call.
//!
//! Reasoning engines are opaque: an adapter hands a [`backend::BackendRequest`]
//! to an [`backend::IReasoningBackend`] and reports whatever comes back as a
//! `TaskResult`. Adapter failures never escape as errors.

pub mod backend;
pub mod backend_adapter;
pub mod knowledge;
pub mod prompts;
pub mod registry;
pub mod triggers;

pub use backend_adapter::BackendAdapter;
pub use knowledge::KnowledgeAdapter;
pub use prompts::Prompts;
pub use registry::AdapterRegistry;
