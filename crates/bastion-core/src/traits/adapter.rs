use async_trait::async_trait;

use crate::models::{Task, TaskResult, TriggerSet};

/// A single reasoning capability behind a uniform contract.
///
/// Adapters never see each other. Failures come back as error results, not
/// as `Err`, so one adapter cannot sink a fan-out.
#[async_trait]
pub trait ICapabilityAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// What this adapter answers to. Consulted even when unavailable.
    fn declared_triggers(&self) -> &TriggerSet;

    /// Checked once, then cached for the life of the process.
    async fn is_available(&self) -> bool;

    async fn execute(&self, task: &Task) -> TaskResult;
}
