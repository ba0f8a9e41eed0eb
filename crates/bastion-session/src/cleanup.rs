//! Stale session sweep results.

/// What one cleanup pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Active sessions aborted for inactivity.
    pub aborted: Vec<String>,
    /// Closed sessions dropped from memory.
    pub evicted: Vec<String>,
}

impl CleanupReport {
    pub fn is_empty(&self) -> bool {
        self.aborted.is_empty() && self.evicted.is_empty()
    }
}
