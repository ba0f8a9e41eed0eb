use bastion_core::errors::*;

#[test]
fn session_errors_carry_context() {
    let err = SessionError::PhaseOrder {
        session_id: "s-1".into(),
        expected: "reconnaissance".into(),
        requested: "mitigation".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("s-1"));
    assert!(msg.contains("reconnaissance"));
    assert!(msg.contains("mitigation"));
}

#[test]
fn error_codes_are_stable() {
    let busy = SessionError::SessionBusy {
        session_id: "s-2".into(),
    };
    assert_eq!(busy.error_code(), "SESSION_BUSY");

    let wrapped: BastionError = busy.into();
    assert_eq!(wrapped.error_code(), "SESSION_BUSY");
    assert!(wrapped.coded_string().starts_with("[SESSION_BUSY]"));

    let inconsistent: BastionError = RetrievalError::EmbeddingInconsistency {
        stored: "a".into(),
        current: "b".into(),
    }
    .into();
    assert_eq!(inconsistent.error_code(), "EMBEDDING_INCONSISTENCY");

    let closed: BastionError = SessionError::SessionClosed {
        session_id: "s-3".into(),
        status: "completed".into(),
    }
    .into();
    assert_eq!(closed.error_code(), "SESSION_CLOSED");
}

#[test]
fn storage_error_variants_have_distinct_codes() {
    let cases: [(StorageError, &str); 3] = [
        (
            StorageError::SqliteError {
                message: "disk I/O error".into(),
            },
            "STORAGE_ERROR",
        ),
        (
            StorageError::MigrationFailed {
                version: 2,
                reason: "no such table".into(),
            },
            "MIGRATION_FAILED",
        ),
        (
            StorageError::CorruptRow {
                table: "knowledge_chunks".into(),
                details: "bad metadata".into(),
            },
            "DB_CORRUPT",
        ),
    ];
    for (err, code) in cases {
        let wrapped: BastionError = err.into();
        assert_eq!(wrapped.error_code(), code);
    }
}

#[test]
fn adapter_error_reasons_match_payload_vocabulary() {
    let cases = [
        (AdapterError::Unavailable { adapter: "a".into() }, "unavailable"),
        (
            AdapterError::Timeout {
                adapter: "a".into(),
                timeout_secs: 1.0,
            },
            "timeout",
        ),
        (
            AdapterError::InvocationFailed {
                adapter: "a".into(),
                reason: "exit 2".into(),
            },
            "invocation_failed",
        ),
        (
            AdapterError::MissingInput {
                adapter: "a".into(),
                field: "target".into(),
            },
            "missing_input",
        ),
        (AdapterError::Panicked { adapter: "a".into() }, "panicked"),
    ];
    for (err, reason) in cases {
        assert_eq!(err.reason(), reason);
    }
}

#[test]
fn failed_task_result_embeds_reason() {
    let err = AdapterError::Timeout {
        adapter: "tool_execution".into(),
        timeout_secs: 2.0,
    };
    let result = bastion_core::TaskResult::failed("tool_execution", &err);
    assert_eq!(result.status, bastion_core::ResultStatus::Error);
    assert_eq!(result.reason(), Some("timeout"));
    assert!(!result.succeeded());
}
