//! audit_log queries. There is no update or delete path.

use rusqlite::{params, Connection};

use bastion_core::errors::BastionResult;
use bastion_core::models::{AuditKind, AuditRecord};

use super::{corrupt, parse_ts};
use crate::to_storage_err;

pub fn insert_audit_record(conn: &Connection, record: &AuditRecord) -> BastionResult<()> {
    conn.execute(
        "INSERT INTO audit_log (record_id, kind, subject_id, payload, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            record.record_id,
            record.kind.as_str(),
            record.subject_id,
            serde_json::to_string(&record.payload)?,
            record.recorded_at.to_rfc3339(),
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Records about one task or session, oldest first.
pub fn query_by_subject(conn: &Connection, subject_id: &str) -> BastionResult<Vec<AuditRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT record_id, kind, subject_id, payload, recorded_at
             FROM audit_log WHERE subject_id = ?1 ORDER BY rowid",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![subject_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut records = Vec::new();
    for row in rows {
        let (record_id, kind, subject_id, payload, recorded_at) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let kind: AuditKind = kind.parse().map_err(|e: String| corrupt("audit_log", e))?;
        records.push(AuditRecord {
            record_id,
            kind,
            subject_id,
            payload: serde_json::from_str(&payload)?,
            recorded_at: parse_ts("audit_log", &recorded_at)?,
        });
    }
    Ok(records)
}

pub fn count_by_kind(conn: &Connection, kind: AuditKind) -> BastionResult<usize> {
    conn.query_row(
        "SELECT COUNT(*) FROM audit_log WHERE kind = ?1",
        params![kind.as_str()],
        |row| row.get::<_, i64>(0),
    )
    .map(|n| n as usize)
    .map_err(|e| to_storage_err(e.to_string()))
}
