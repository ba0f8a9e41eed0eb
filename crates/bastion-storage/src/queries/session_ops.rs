//! sessions and phase_records queries.

use rusqlite::{params, Connection, OptionalExtension};

use bastion_core::errors::BastionResult;
use bastion_core::models::{Phase, PhaseRecord, Session, SessionStatus};

use super::{corrupt, parse_ts};
use crate::to_storage_err;

pub fn upsert_session(conn: &Connection, session: &Session) -> BastionResult<()> {
    conn.execute(
        "INSERT INTO sessions
         (session_id, target_descriptor, status, created_at, updated_at, closed_reason, final_report)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(session_id) DO UPDATE SET
            status = excluded.status,
            updated_at = excluded.updated_at,
            closed_reason = excluded.closed_reason,
            final_report = excluded.final_report",
        params![
            session.session_id,
            session.target_descriptor,
            session.status.as_str(),
            session.created_at.to_rfc3339(),
            session.updated_at.to_rfc3339(),
            session.closed_reason,
            session.final_report,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn insert_phase_record(
    conn: &Connection,
    session_id: &str,
    seq: usize,
    record: &PhaseRecord,
) -> BastionResult<()> {
    conn.execute(
        "INSERT INTO phase_records
         (session_id, seq, phase_name, input_directive, output_analysis, skipped, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            session_id,
            seq as i64,
            record.phase_name.as_str(),
            record.input_directive,
            record.output_analysis,
            record.skipped,
            record.timestamp.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Insert `records` from `start_seq` and upsert the header in one transaction.
pub fn append_phases(
    conn: &Connection,
    session: &Session,
    start_seq: usize,
    records: &[PhaseRecord],
) -> BastionResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;
    for (offset, record) in records.iter().enumerate() {
        insert_phase_record(&tx, &session.session_id, start_seq + offset, record)?;
    }
    upsert_session(&tx, session)?;
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

fn load_records(conn: &Connection, session_id: &str) -> BastionResult<Vec<PhaseRecord>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT phase_name, input_directive, output_analysis, skipped, recorded_at
             FROM phase_records WHERE session_id = ?1 ORDER BY seq",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, bool>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (phase, directive, analysis, skipped, recorded_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let phase_name: Phase = phase
            .parse()
            .map_err(|_| corrupt("phase_records", format!("unknown phase {phase:?}")))?;
        records.push(PhaseRecord {
            phase_name,
            input_directive: directive,
            output_analysis: analysis,
            timestamp: parse_ts("phase_records", &recorded_at)?,
            skipped,
        });
    }
    Ok(records)
}

type SessionRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
);

fn session_from_row(conn: &Connection, row: SessionRow) -> BastionResult<Session> {
    let (session_id, target, status, created_at, updated_at, closed_reason, final_report) = row;
    let status: SessionStatus = status
        .parse()
        .map_err(|e: String| corrupt("sessions", e))?;
    let phase_history = load_records(conn, &session_id)?;
    Ok(Session {
        target_descriptor: target,
        status,
        phase_history,
        created_at: parse_ts("sessions", &created_at)?,
        updated_at: parse_ts("sessions", &updated_at)?,
        closed_reason,
        final_report,
        session_id,
    })
}

const SESSION_COLUMNS: &str =
    "session_id, target_descriptor, status, created_at, updated_at, closed_reason, final_report";

fn read_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

pub fn get_session(conn: &Connection, session_id: &str) -> BastionResult<Option<Session>> {
    let row = conn
        .query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE session_id = ?1"),
            params![session_id],
            read_session_row,
        )
        .optional()
        .map_err(|e| to_storage_err(e.to_string()))?;
    row.map(|r| session_from_row(conn, r)).transpose()
}

pub fn list_sessions_by_status(
    conn: &Connection,
    status: SessionStatus,
) -> BastionResult<Vec<Session>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE status = ?1 ORDER BY rowid"
        ))
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows: Vec<SessionRow> = stmt
        .query_map(params![status.as_str()], read_session_row)
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<_, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    rows.into_iter().map(|r| session_from_row(conn, r)).collect()
}
