use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SessionError;

/// Assessment phases in canonical order. Variant order is the only ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Reconnaissance,
    VulnerabilityIdentification,
    ExploitationAnalysis,
    Mitigation,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Reconnaissance,
        Phase::VulnerabilityIdentification,
        Phase::ExploitationAnalysis,
        Phase::Mitigation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reconnaissance => "reconnaissance",
            Self::VulnerabilityIdentification => "vulnerability_identification",
            Self::ExploitationAnalysis => "exploitation_analysis",
            Self::Mitigation => "mitigation",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Reconnaissance => "Reconnaissance",
            Self::VulnerabilityIdentification => "Vulnerability Identification",
            Self::ExploitationAnalysis => "Exploitation Analysis",
            Self::Mitigation => "Mitigation",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Phase> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn first() -> Phase {
        Phase::Reconnaissance
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == normalized)
            .ok_or_else(|| SessionError::UnknownPhase {
                name: s.to_string(),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
    Aborted,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "aborted" => Ok(Self::Aborted),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

/// One transcript entry. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase_name: Phase,
    pub input_directive: String,
    pub output_analysis: String,
    pub timestamp: DateTime<Utc>,
    /// Recorded as passed over by an explicit skip.
    pub skipped: bool,
}

impl PhaseRecord {
    pub fn completed(
        phase: Phase,
        directive: impl Into<String>,
        analysis: impl Into<String>,
    ) -> Self {
        Self {
            phase_name: phase,
            input_directive: directive.into(),
            output_analysis: analysis.into(),
            timestamp: Utc::now(),
            skipped: false,
        }
    }

    pub fn skipped(phase: Phase) -> Self {
        Self {
            phase_name: phase,
            input_directive: String::new(),
            output_analysis: String::new(),
            timestamp: Utc::now(),
            skipped: true,
        }
    }
}

/// One assessment engagement against a single target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub target_descriptor: String,
    pub status: SessionStatus,
    pub phase_history: Vec<PhaseRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub closed_reason: Option<String>,
    pub final_report: Option<String>,
}

impl Session {
    pub fn new(target: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            target_descriptor: target.into(),
            status: SessionStatus::Active,
            phase_history: Vec::new(),
            created_at: now,
            updated_at: now,
            closed_reason: None,
            final_report: None,
        }
    }

    /// Next phase the transcript accepts, `None` once mitigation is recorded.
    pub fn next_expected_phase(&self) -> Option<Phase> {
        match self.phase_history.last() {
            None => Some(Phase::first()),
            Some(last) => last.phase_name.next(),
        }
    }

    pub fn last_phase(&self) -> Option<Phase> {
        self.phase_history.last().map(|r| r.phase_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Lowercased, trimmed target used for duplicate detection.
    pub fn target_key(target: &str) -> String {
        target.trim().to_lowercase()
    }
}

/// The synthesized output of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalReport {
    pub session_id: String,
    pub target: String,
    pub phases: Vec<Phase>,
    pub skipped_phases: Vec<Phase>,
    pub report: String,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order() {
        assert!(Phase::Reconnaissance < Phase::VulnerabilityIdentification);
        assert!(Phase::ExploitationAnalysis < Phase::Mitigation);
        assert_eq!(Phase::Reconnaissance.next(), Some(Phase::VulnerabilityIdentification));
        assert_eq!(Phase::Mitigation.next(), None);
    }

    #[test]
    fn phase_parsing_is_lenient_about_separators() {
        assert_eq!(
            "Vulnerability Identification".parse::<Phase>().ok(),
            Some(Phase::VulnerabilityIdentification)
        );
        assert_eq!("exploitation-analysis".parse::<Phase>().ok(), Some(Phase::ExploitationAnalysis));
        assert!("post_exploitation".parse::<Phase>().is_err());
    }

    #[test]
    fn next_expected_follows_history() {
        let mut session = Session::new("target.com");
        assert_eq!(session.next_expected_phase(), Some(Phase::Reconnaissance));
        session.phase_history.push(PhaseRecord::completed(Phase::Reconnaissance, "d", "a"));
        assert_eq!(session.next_expected_phase(), Some(Phase::VulnerabilityIdentification));
    }
}
