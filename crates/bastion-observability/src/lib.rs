//! # bastion-observability
//!
//! Tracing subscriber setup, structured event helpers, span macros, and
//! health reporting across storage, knowledge, adapters, and the scheduler.

pub mod health;
pub mod tracing_setup;

pub use health::{HealthReporter, HealthSnapshot, SubsystemChecker};
pub use tracing_setup::init_tracing;
