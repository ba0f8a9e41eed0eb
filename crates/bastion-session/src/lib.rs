//! # bastion-session
//!
//! Tracks security-assessment engagements through the canonical phases,
//! persists their transcripts, and synthesizes a final report.

pub mod cleanup;
mod guard;
pub mod machine;
pub mod report;

pub use cleanup::CleanupReport;
pub use machine::SessionStateMachine;
pub use report::synthesize_report;
