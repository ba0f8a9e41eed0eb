//! Bounded task scheduler.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use bastion_core::errors::{BastionError, BastionResult};

/// Caps in-flight work at `max_concurrent`. Excess callers wait in FIFO
/// order; tokio's semaphore is fair.
#[derive(Clone)]
pub struct Scheduler {
    permits: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    max_concurrent: usize,
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Scheduler {
    pub fn new(max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_concurrent,
        }
    }

    /// Wait for a slot, then drive `work` to completion while holding it.
    pub async fn run<F, T>(&self, work: F) -> BastionResult<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| BastionError::ShuttingDown)?;
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        let _slot = InFlight(Arc::clone(&self.in_flight));
        Ok(work.await)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Refuse new work. Running work finishes; waiters get `ShuttingDown`.
    pub fn close(&self) {
        self.permits.close();
        debug!("scheduler closed");
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}
