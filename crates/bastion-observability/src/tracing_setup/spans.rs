//! Span definitions per operation: routing, session phases, retrieval.

/// Span around one routed task.
#[macro_export]
macro_rules! routing_span {
    ($task_id:expr) => {
        tracing::info_span!("bastion.routing", task_id = %$task_id)
    };
}

/// Span around one session operation.
#[macro_export]
macro_rules! session_span {
    ($session_id:expr, $operation:expr) => {
        tracing::info_span!("bastion.session", session_id = %$session_id, operation = %$operation)
    };
}

/// Span around a knowledge ingest or query.
#[macro_export]
macro_rules! retrieval_span {
    ($operation:expr, $subject:expr) => {
        tracing::info_span!("bastion.retrieval", operation = %$operation, subject = %$subject)
    };
}
