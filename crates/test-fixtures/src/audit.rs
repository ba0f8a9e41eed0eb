use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bastion_core::errors::{BastionError, StorageError};
use bastion_core::models::{AuditKind, AuditRecord};
use bastion_core::traits::IAuditSink;
use bastion_core::BastionResult;

/// Keeps every audit record in memory. Can be told to fail.
#[derive(Default)]
pub struct RecordingAuditSink {
    records: Mutex<Vec<AuditRecord>>,
    failing: AtomicBool,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that rejects every record.
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: AuditKind) -> Vec<AuditRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.kind == kind)
            .collect()
    }
}

#[async_trait]
impl IAuditSink for RecordingAuditSink {
    async fn record(&self, record: AuditRecord) -> BastionResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BastionError::Storage(StorageError::SqliteError {
                message: "audit sink offline".to_string(),
            }));
        }
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}
