//! Structured log events for key operations.
//!
//! Each function emits one `tracing` event with an `event` field naming it.

use bastion_core::models::{CombinedResult, SessionStatus, TaskResult};

pub fn task_routed(result: &CombinedResult) {
    tracing::info!(
        event = "task_routed",
        task_id = %result.task_id,
        task_type = %result.task_type,
        status = %result.status,
        adapters = result.results.len(),
        summary = %result.summary,
        "task routed"
    );
}

/// Logs every failed branch of a combined result.
pub fn adapter_failed(task_id: &str, result: &TaskResult) {
    if let Some(reason) = result.reason() {
        tracing::warn!(
            event = "adapter_failed",
            task_id = %task_id,
            adapter = %result.source_adapter,
            reason = %reason,
            latency_ms = result.latency.as_millis() as u64,
            "adapter failed"
        );
    }
}

pub fn session_transition(session_id: &str, target: &str, status: SessionStatus, detail: &str) {
    tracing::info!(
        event = "session_transition",
        session_id = %session_id,
        target = %target,
        status = %status,
        detail = %detail,
        "session transition"
    );
}

pub fn document_ingested(source_id: &str, collection: &str, chunks: usize) {
    tracing::info!(
        event = "document_ingested",
        source_id = %source_id,
        collection = %collection,
        chunks = chunks,
        "document ingested"
    );
}

pub fn embedding_inconsistency(stored: &str, current: &str) {
    tracing::error!(
        event = "embedding_inconsistency",
        stored = %stored,
        current = %current,
        "stored vectors were produced by a different embedding function; reset required"
    );
}
