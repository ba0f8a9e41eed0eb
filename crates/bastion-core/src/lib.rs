//! # bastion-core
//!
//! Foundation crate for the Bastion orchestration engine.
//! Defines all types, traits, errors, config, and constants.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::BastionConfig;
pub use errors::{BastionError, BastionResult};
pub use models::{
    Collection, CombinedResult, DocumentChunk, Phase, PhaseRecord, ResultStatus, RetrievalQuery,
    RetrievalResult, RoutingDecision, Session, SessionStatus, Task, TaskResult,
};
