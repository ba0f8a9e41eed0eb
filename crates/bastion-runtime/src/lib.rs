//! # bastion-runtime
//!
//! Wires storage, embeddings, retrieval, adapters, the router, and the
//! session state machine into one [`Bastion`] handle. Tasks run under a
//! concurrency cap; ingestion, health checks, and session cleanup run as
//! interval jobs.

pub mod engine;
pub mod health;
pub mod jobs;
pub mod scheduler;

pub use engine::{Bastion, BastionBuilder};
pub use health::HealthCollector;
pub use jobs::{BackgroundJobs, JobIntervals};
pub use scheduler::Scheduler;
