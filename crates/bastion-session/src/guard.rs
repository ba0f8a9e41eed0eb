//! Per-session busy flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Holds a session's busy flag until dropped.
pub(crate) struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl BusyGuard {
    /// Claim the flag, or `None` when another operation holds it.
    pub(crate) fn try_claim(flag: Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
