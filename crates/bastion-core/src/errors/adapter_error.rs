use super::error_code::{self, BastionErrorCode};

/// Capability adapter failures. The router never propagates these; it folds
/// them into an error `TaskResult` using [`AdapterError::reason`].
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("adapter {adapter} is unavailable")]
    Unavailable { adapter: String },

    #[error("adapter {adapter} timed out after {timeout_secs}s")]
    Timeout { adapter: String, timeout_secs: f64 },

    #[error("adapter {adapter} invocation failed: {reason}")]
    InvocationFailed { adapter: String, reason: String },

    #[error("adapter {adapter} is missing required input: {field}")]
    MissingInput { adapter: String, field: String },

    #[error("adapter {adapter} panicked")]
    Panicked { adapter: String },

    #[error("no adapter registered under {name}")]
    NoAdapter { name: String },
}

impl AdapterError {
    /// Short machine-readable reason placed in a result payload.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "unavailable",
            Self::Timeout { .. } => "timeout",
            Self::InvocationFailed { .. } => "invocation_failed",
            Self::MissingInput { .. } => "missing_input",
            Self::Panicked { .. } => "panicked",
            Self::NoAdapter { .. } => "no_adapter",
        }
    }
}

impl BastionErrorCode for AdapterError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => error_code::ADAPTER_UNAVAILABLE,
            Self::Timeout { .. } => error_code::ADAPTER_TIMEOUT,
            Self::InvocationFailed { .. } => error_code::ADAPTER_FAILED,
            Self::MissingInput { .. } => error_code::ADAPTER_MISSING_INPUT,
            Self::Panicked { .. } => error_code::ADAPTER_PANICKED,
            Self::NoAdapter { .. } => error_code::NO_ADAPTER,
        }
    }
}
