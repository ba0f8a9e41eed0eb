use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    RoutingDecision,
    CombinedResult,
    SessionTransition,
    PhaseRecord,
}

impl AuditKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RoutingDecision => "routing_decision",
            Self::CombinedResult => "combined_result",
            Self::SessionTransition => "session_transition",
            Self::PhaseRecord => "phase_record",
        }
    }
}

impl std::str::FromStr for AuditKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "routing_decision" => Ok(Self::RoutingDecision),
            "combined_result" => Ok(Self::CombinedResult),
            "session_transition" => Ok(Self::SessionTransition),
            "phase_record" => Ok(Self::PhaseRecord),
            other => Err(format!("unknown audit kind: {other}")),
        }
    }
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub record_id: String,
    pub kind: AuditKind,
    /// Task id or session id the record is about.
    pub subject_id: String,
    pub payload: Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(kind: AuditKind, subject_id: impl Into<String>, payload: Value) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            kind,
            subject_id: subject_id.into(),
            payload,
            recorded_at: Utc::now(),
        }
    }
}
