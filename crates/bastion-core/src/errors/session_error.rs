use super::error_code::{self, BastionErrorCode};

/// Session state machine rejections. Every variant leaves the session untouched,
/// except `PhaseTimeout`, which reports that the session was aborted.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("an active session already exists for target {target}: {existing_id}")]
    DuplicateSession { target: String, existing_id: String },

    #[error("phase order violation in {session_id}: expected {expected}, got {requested}")]
    PhaseOrder {
        session_id: String,
        expected: String,
        requested: String,
    },

    #[error("session {session_id} has a phase operation in flight")]
    SessionBusy { session_id: String },

    #[error("session {session_id} is {status}")]
    SessionClosed { session_id: String, status: String },

    #[error("session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("session {session_id} has no phase records")]
    EmptyTranscript { session_id: String },

    #[error("phase {phase} of {session_id} exceeded {timeout_secs}s; session aborted")]
    PhaseTimeout {
        session_id: String,
        phase: String,
        timeout_secs: f64,
    },

    #[error("phase {phase} analysis failed: {reason}")]
    PhaseAnalysisFailed { phase: String, reason: String },

    #[error("unknown phase: {name}")]
    UnknownPhase { name: String },

    #[error("invalid session target: {target:?}")]
    InvalidTarget { target: String },
}

impl BastionErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateSession { .. } => error_code::DUPLICATE_SESSION,
            Self::PhaseOrder { .. } => error_code::PHASE_ORDER,
            Self::SessionBusy { .. } => error_code::SESSION_BUSY,
            Self::SessionClosed { .. } => error_code::SESSION_CLOSED,
            Self::SessionNotFound { .. } => error_code::SESSION_NOT_FOUND,
            Self::EmptyTranscript { .. } => error_code::EMPTY_TRANSCRIPT,
            Self::PhaseTimeout { .. } => error_code::PHASE_TIMEOUT,
            Self::PhaseAnalysisFailed { .. } => error_code::PHASE_ANALYSIS_FAILED,
            Self::UnknownPhase { .. } => error_code::UNKNOWN_PHASE,
            Self::InvalidTarget { .. } => error_code::INVALID_TARGET,
        }
    }
}
