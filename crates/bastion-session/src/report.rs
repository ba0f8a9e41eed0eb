//! Final report synthesis.

use chrono::Utc;

use bastion_core::models::{FinalReport, Session};

/// Concatenate phase outputs in canonical order under one heading per phase.
/// Skipped phases keep their heading so the gap is visible.
pub fn synthesize_report(session: &Session) -> FinalReport {
    let mut report = format!(
        "# Security Assessment: {}\nSession: {}\n",
        session.target_descriptor, session.session_id
    );
    let mut phases = Vec::new();
    let mut skipped_phases = Vec::new();

    for record in &session.phase_history {
        report.push_str("\n## ");
        report.push_str(record.phase_name.title());
        report.push('\n');
        if record.skipped {
            skipped_phases.push(record.phase_name);
            report.push_str("_Skipped._\n");
        } else {
            phases.push(record.phase_name);
            report.push_str(record.output_analysis.trim());
            report.push('\n');
        }
    }

    FinalReport {
        session_id: session.session_id.clone(),
        target: session.target_descriptor.clone(),
        phases,
        skipped_phases,
        report,
        completed_at: Utc::now(),
    }
}

/// Prior phase outputs, fed to the analyst as context for the next phase.
pub(crate) fn transcript(session: &Session) -> String {
    session
        .phase_history
        .iter()
        .filter(|r| !r.skipped)
        .map(|r| format!("[{}]\n{}", r.phase_name, r.output_analysis.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
