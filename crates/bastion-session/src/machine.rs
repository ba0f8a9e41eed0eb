//! SessionStateMachine: the only writer of session state.
//!
//! Sessions live in a `DashMap` keyed by id. Phase operations on one session
//! are serialized by a per-session busy flag; a second caller is rejected
//! rather than queued. Different sessions never contend beyond a shard lock.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use bastion_core::config::SessionConfig;
use bastion_core::constants::{
    CATEGORY_PENETRATION_TESTING, CTX_PHASE, CTX_TARGET, CTX_TRANSCRIPT, PAYLOAD_DETAIL,
    PAYLOAD_REASON,
};
use bastion_core::errors::{BastionResult, SessionError};
use bastion_core::models::{
    AuditKind, AuditRecord, FinalReport, Phase, PhaseRecord, ResultStatus, Session,
    SessionStatus, Task, TaskResult,
};
use bastion_core::traits::{IAuditSink, ICapabilityAdapter, ISessionStore};

use crate::cleanup::CleanupReport;
use crate::guard::BusyGuard;
use crate::report::{synthesize_report, transcript};

const PHASE_TIMEOUT_REASON: &str = "phase timeout";
const INACTIVITY_REASON: &str = "inactivity timeout";

/// Payload keys an analyst may put its text under, in preference order.
const ANALYSIS_KEYS: &[&str] = &["analysis", "response", "output"];

pub struct SessionStateMachine {
    config: SessionConfig,
    analyst: Arc<dyn ICapabilityAdapter>,
    store: Option<Arc<dyn ISessionStore>>,
    audit: Option<Arc<dyn IAuditSink>>,
    sessions: DashMap<String, Session>,
    /// Normalized target -> id of its active session.
    active_targets: DashMap<String, String>,
    busy: DashMap<String, Arc<AtomicBool>>,
    /// Held from the persist of a transition until memory reflects it.
    commit: Mutex<()>,
}

impl SessionStateMachine {
    /// `analyst` produces each phase's output analysis.
    pub fn new(config: SessionConfig, analyst: Arc<dyn ICapabilityAdapter>) -> Self {
        Self {
            config,
            analyst,
            store: None,
            audit: None,
            sessions: DashMap::new(),
            active_targets: DashMap::new(),
            busy: DashMap::new(),
            commit: Mutex::new(()),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ISessionStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn IAuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    // ── Queries ──

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    pub fn session(&self, session_id: &str) -> BastionResult<Session> {
        self.get(session_id)
            .ok_or_else(|| not_found(session_id).into())
    }

    pub fn active_count(&self) -> usize {
        self.sessions.iter().filter(|s| s.is_active()).count()
    }

    pub fn active_session_ids(&self) -> Vec<String> {
        self.sessions
            .iter()
            .filter(|s| s.is_active())
            .map(|s| s.key().clone())
            .collect()
    }

    /// Sessions held in memory, active or recently closed.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    // ── Transitions ──

    /// Open a session for `target`. At most one active session per target,
    /// compared case-insensitively.
    pub async fn start(&self, target: &str) -> BastionResult<Session> {
        let key = Session::target_key(target);
        if key.is_empty() {
            return Err(SessionError::InvalidTarget {
                target: target.to_string(),
            }
            .into());
        }

        let session = Session::new(target.trim());
        let id = session.session_id.clone();
        match self.active_targets.entry(key.clone()) {
            Entry::Occupied(existing) => {
                return Err(SessionError::DuplicateSession {
                    target: target.trim().to_string(),
                    existing_id: existing.get().clone(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(id.clone());
            }
        }
        self.busy.insert(id.clone(), Arc::new(AtomicBool::new(false)));
        self.sessions.insert(id.clone(), session.clone());

        if let Err(e) = self.persist_header(&session).await {
            self.sessions.remove(&id);
            self.busy.remove(&id);
            self.active_targets.remove_if(&key, |_, owner| *owner == id);
            return Err(e);
        }
        self.audit_transition(&session, None).await;
        info!(session_id = %id, target = %session.target_descriptor, "session started");
        Ok(session)
    }

    /// Run `phase` and append its record. With `skip_allowed`, a phase later
    /// than the next expected one records every phase in between as skipped.
    pub async fn advance_phase(
        &self,
        session_id: &str,
        phase: Phase,
        directive: &str,
        skip_allowed: bool,
    ) -> BastionResult<PhaseRecord> {
        let _guard = self.claim(session_id)?;
        let snapshot = self.active_snapshot(session_id)?;
        let skipped = plan_phases(&snapshot, phase, skip_allowed)?;

        let analysis = self.analyze(&snapshot, phase, directive).await?;
        let record = PhaseRecord::completed(phase, directive, analysis);

        let mut appended: Vec<PhaseRecord> =
            skipped.into_iter().map(PhaseRecord::skipped).collect();
        appended.push(record.clone());

        let start_seq = {
            let _commit = self.commit.lock().await;
            // The session may have been aborted while the analyst ran.
            let mut updated = self.active_snapshot(session_id)?;
            let start_seq = updated.phase_history.len();
            updated.phase_history.extend(appended.iter().cloned());
            updated.updated_at = Utc::now();
            if let Some(store) = &self.store {
                store.append_phases(&updated, start_seq, &appended).await?;
            }
            self.sessions.insert(session_id.to_string(), updated);
            start_seq
        };

        for (offset, rec) in appended.iter().enumerate() {
            self.audit(AuditRecord::new(
                AuditKind::PhaseRecord,
                session_id,
                json!({
                    "seq": start_seq + offset,
                    "phase": rec.phase_name,
                    "skipped": rec.skipped,
                }),
            ))
            .await;
        }

        info!(
            session_id,
            phase = %phase,
            skipped = appended.len() - 1,
            "phase recorded"
        );
        Ok(record)
    }

    /// Close the session and synthesize its report. Needs at least one record.
    pub async fn complete(&self, session_id: &str) -> BastionResult<FinalReport> {
        let _guard = self.claim(session_id)?;
        let snapshot = self.active_snapshot(session_id)?;
        if snapshot.phase_history.is_empty() {
            return Err(SessionError::EmptyTranscript {
                session_id: session_id.to_string(),
            }
            .into());
        }

        let report = synthesize_report(&snapshot);
        self.close(
            session_id,
            SessionStatus::Completed,
            None,
            Some(report.report.clone()),
        )
        .await?;
        Ok(report)
    }

    /// Abort a non-terminal session.
    pub async fn abort(&self, session_id: &str, reason: &str) -> BastionResult<Session> {
        self.close(session_id, SessionStatus::Aborted, Some(reason.to_string()), None)
            .await
    }

    // ── Lifecycle ──

    /// Reload active sessions from the store. Returns how many were restored.
    pub async fn restore(&self) -> BastionResult<usize> {
        let Some(store) = &self.store else {
            return Ok(0);
        };
        let mut restored = 0;
        for session in store.load_active_sessions().await? {
            if self.sessions.contains_key(&session.session_id) {
                continue;
            }
            let id = session.session_id.clone();
            match self
                .active_targets
                .entry(Session::target_key(&session.target_descriptor))
            {
                Entry::Occupied(existing) => {
                    warn!(
                        session_id = %id,
                        existing = %existing.get(),
                        "skipping persisted session with duplicate target"
                    );
                    continue;
                }
                Entry::Vacant(slot) => {
                    slot.insert(id.clone());
                }
            }
            self.busy.insert(id.clone(), Arc::new(AtomicBool::new(false)));
            self.sessions.insert(id, session);
            restored += 1;
        }
        info!(restored, "active sessions restored");
        Ok(restored)
    }

    pub async fn cleanup_stale(&self) -> CleanupReport {
        self.cleanup_stale_at(Utc::now()).await
    }

    /// Abort active sessions idle past the inactivity timeout and evict closed
    /// sessions past retention. Persisted transcripts are untouched.
    pub async fn cleanup_stale_at(&self, now: DateTime<Utc>) -> CleanupReport {
        let inactivity = seconds(self.config.inactivity_timeout_secs);
        let retention = seconds(self.config.retention_secs);

        let mut idle = Vec::new();
        let mut expired = Vec::new();
        for entry in self.sessions.iter() {
            let age = now - entry.updated_at;
            if entry.is_active() {
                if age > inactivity {
                    idle.push(entry.key().clone());
                }
            } else if age > retention {
                expired.push(entry.key().clone());
            }
        }

        let mut report = CleanupReport::default();
        for id in idle {
            // An in-flight phase counts as activity.
            let Some(_guard) = self.busy_flag(&id).and_then(BusyGuard::try_claim) else {
                continue;
            };
            match self
                .close(&id, SessionStatus::Aborted, Some(INACTIVITY_REASON.to_string()), None)
                .await
            {
                Ok(_) => report.aborted.push(id),
                Err(e) => warn!(session_id = %id, error = %e, "failed to abort idle session"),
            }
        }
        for id in expired {
            self.sessions.remove(&id);
            self.busy.remove(&id);
            report.evicted.push(id);
        }

        if !report.is_empty() {
            info!(
                aborted = report.aborted.len(),
                evicted = report.evicted.len(),
                "session cleanup"
            );
        }
        report
    }

    // ── Internals ──

    fn busy_flag(&self, session_id: &str) -> Option<Arc<AtomicBool>> {
        self.busy.get(session_id).map(|f| Arc::clone(&f))
    }

    fn claim(&self, session_id: &str) -> BastionResult<BusyGuard> {
        let flag = {
            let session = self
                .sessions
                .get(session_id)
                .ok_or_else(|| not_found(session_id))?;
            if session.status.is_terminal() {
                return Err(closed(&session).into());
            }
            Arc::clone(&self.busy.entry(session_id.to_string()).or_default())
        };
        BusyGuard::try_claim(flag).ok_or_else(|| {
            SessionError::SessionBusy {
                session_id: session_id.to_string(),
            }
            .into()
        })
    }

    fn active_snapshot(&self, session_id: &str) -> BastionResult<Session> {
        let session = self.session(session_id)?;
        if session.status.is_terminal() {
            return Err(closed(&session).into());
        }
        Ok(session)
    }

    /// Ask the analyst for one phase's output. A timeout aborts the session.
    async fn analyze(
        &self,
        session: &Session,
        phase: Phase,
        directive: &str,
    ) -> BastionResult<String> {
        let prompt = if directive.trim().is_empty() {
            format!(
                "Perform the {} phase of a security assessment of {}.",
                phase.title(),
                session.target_descriptor
            )
        } else {
            directive.trim().to_string()
        };
        let mut task = Task::new(prompt)
            .with_declared_type(CATEGORY_PENETRATION_TESTING)
            .with_context(CTX_TARGET, session.target_descriptor.clone())
            .with_context(CTX_PHASE, phase.as_str());
        let prior = transcript(session);
        if !prior.is_empty() {
            task = task.with_context(CTX_TRANSCRIPT, prior);
        }

        let analyst = Arc::clone(&self.analyst);
        let handle = tokio::spawn(async move { analyst.execute(&task).await });
        let abort = handle.abort_handle();
        debug!(session_id = %session.session_id, phase = %phase, "phase analysis started");

        let result = match tokio::time::timeout(self.config.phase_timeout(), handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => {
                let reason = if join.is_panic() {
                    "analyst panicked".to_string()
                } else {
                    join.to_string()
                };
                return Err(SessionError::PhaseAnalysisFailed {
                    phase: phase.to_string(),
                    reason,
                }
                .into());
            }
            Err(_) => {
                abort.abort();
                warn!(session_id = %session.session_id, phase = %phase, "phase analysis timed out");
                if let Err(e) = self
                    .close(
                        &session.session_id,
                        SessionStatus::Aborted,
                        Some(PHASE_TIMEOUT_REASON.to_string()),
                        None,
                    )
                    .await
                {
                    warn!(
                        session_id = %session.session_id,
                        error = %e,
                        "abort after timeout failed"
                    );
                }
                return Err(SessionError::PhaseTimeout {
                    session_id: session.session_id.clone(),
                    phase: phase.to_string(),
                    timeout_secs: self.config.phase_timeout_seconds,
                }
                .into());
            }
        };

        if result.status == ResultStatus::Error {
            return Err(SessionError::PhaseAnalysisFailed {
                phase: phase.to_string(),
                reason: failure_reason(&result),
            }
            .into());
        }
        Ok(analysis_text(&result))
    }

    async fn close(
        &self,
        session_id: &str,
        status: SessionStatus,
        reason: Option<String>,
        report: Option<String>,
    ) -> BastionResult<Session> {
        let closed_session = {
            let _commit = self.commit.lock().await;
            let mut closed_session = self.active_snapshot(session_id)?;
            closed_session.status = status;
            closed_session.closed_reason = reason;
            closed_session.final_report = report;
            closed_session.updated_at = Utc::now();
            self.persist_header(&closed_session).await?;
            self.sessions
                .insert(session_id.to_string(), closed_session.clone());
            closed_session
        };
        self.active_targets.remove_if(
            &Session::target_key(&closed_session.target_descriptor),
            |_, owner| owner == session_id,
        );

        self.audit_transition(&closed_session, Some(SessionStatus::Active))
            .await;
        info!(
            session_id,
            status = %status,
            reason = closed_session.closed_reason.as_deref().unwrap_or(""),
            "session closed"
        );
        Ok(closed_session)
    }

    async fn persist_header(&self, session: &Session) -> BastionResult<()> {
        match &self.store {
            Some(store) => store.save_session(session).await,
            None => Ok(()),
        }
    }

    async fn audit_transition(&self, session: &Session, from: Option<SessionStatus>) {
        self.audit(AuditRecord::new(
            AuditKind::SessionTransition,
            &session.session_id,
            json!({
                "from": from,
                "to": session.status,
                "target": session.target_descriptor,
                "reason": session.closed_reason,
            }),
        ))
        .await;
    }

    async fn audit(&self, record: AuditRecord) {
        if let Some(sink) = &self.audit {
            if let Err(e) = sink.record(record).await {
                warn!(error = %e, "session audit write failed");
            }
        }
    }
}

/// Phases to record as skipped before `requested`, or the order violation.
pub(crate) fn plan_phases(
    session: &Session,
    requested: Phase,
    skip_allowed: bool,
) -> Result<Vec<Phase>, SessionError> {
    let violation = |expected: &str| SessionError::PhaseOrder {
        session_id: session.session_id.clone(),
        expected: expected.to_string(),
        requested: requested.to_string(),
    };
    let Some(expected) = session.next_expected_phase() else {
        return Err(violation("none"));
    };
    if requested == expected {
        return Ok(Vec::new());
    }
    if skip_allowed && requested > expected {
        return Ok(Phase::ALL[expected.index()..requested.index()].to_vec());
    }
    Err(violation(expected.as_str()))
}

fn analysis_text(result: &TaskResult) -> String {
    ANALYSIS_KEYS
        .iter()
        .find_map(|k| result.payload.get(*k).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(result.payload.clone()).to_string())
}

fn failure_reason(result: &TaskResult) -> String {
    result
        .payload
        .get(PAYLOAD_DETAIL)
        .or_else(|| result.payload.get(PAYLOAD_REASON))
        .and_then(Value::as_str)
        .unwrap_or("analyst returned an error")
        .to_string()
}

fn seconds(secs: u64) -> chrono::Duration {
    chrono::Duration::from_std(std::time::Duration::from_secs(secs))
        .unwrap_or(chrono::Duration::MAX)
}

fn not_found(session_id: &str) -> SessionError {
    SessionError::SessionNotFound {
        session_id: session_id.to_string(),
    }
}

fn closed(session: &Session) -> SessionError {
    SessionError::SessionClosed {
        session_id: session.session_id.clone(),
        status: session.status.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_history(phases: &[Phase]) -> Session {
        let mut s = Session::new("t");
        s.phase_history = phases
            .iter()
            .map(|p| PhaseRecord::completed(*p, "d", "a"))
            .collect();
        s
    }

    #[test]
    fn next_phase_needs_no_skips() {
        let s = with_history(&[Phase::Reconnaissance]);
        assert!(plan_phases(&s, Phase::VulnerabilityIdentification, false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn skipping_ahead_requires_permission() {
        let s = with_history(&[]);
        let err = plan_phases(&s, Phase::ExploitationAnalysis, false).unwrap_err();
        assert!(matches!(err, SessionError::PhaseOrder { ref expected, .. } if expected == "reconnaissance"));
        assert_eq!(
            plan_phases(&s, Phase::ExploitationAnalysis, true).unwrap(),
            vec![Phase::Reconnaissance, Phase::VulnerabilityIdentification]
        );
    }

    #[test]
    fn repeats_and_regressions_are_always_rejected() {
        let s = with_history(&[Phase::Reconnaissance, Phase::VulnerabilityIdentification]);
        assert!(plan_phases(&s, Phase::VulnerabilityIdentification, true).is_err());
        assert!(plan_phases(&s, Phase::Reconnaissance, true).is_err());
    }

    #[test]
    fn nothing_follows_mitigation() {
        let s = with_history(&Phase::ALL);
        let err = plan_phases(&s, Phase::Mitigation, true).unwrap_err();
        assert!(matches!(err, SessionError::PhaseOrder { ref expected, .. } if expected == "none"));
    }

    #[test]
    fn analysis_text_prefers_known_keys() {
        let mut payload = serde_json::Map::new();
        payload.insert("output".into(), Value::from("raw"));
        payload.insert("analysis".into(), Value::from("cooked"));
        assert_eq!(analysis_text(&TaskResult::ok("a", payload)), "cooked");

        let mut payload = serde_json::Map::new();
        payload.insert("findings".into(), Value::from(3));
        assert_eq!(analysis_text(&TaskResult::ok("a", payload)), r#"{"findings":3}"#);
    }
}
