//! # bastion-router
//!
//! Decides which capability adapters handle a task, runs them concurrently
//! under a per-branch deadline, and merges what comes back.

pub mod classifier;
pub mod merge;
pub mod router;

pub use classifier::classify;
pub use merge::{merge_results, merge_status, summarize};
pub use router::Router;
