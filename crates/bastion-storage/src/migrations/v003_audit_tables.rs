//! v003: audit_log (append-only).

use rusqlite::Connection;

use bastion_core::errors::BastionResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> BastionResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS audit_log (
            record_id   TEXT PRIMARY KEY,
            kind        TEXT NOT NULL,
            subject_id  TEXT NOT NULL,
            payload     TEXT NOT NULL DEFAULT '{}',
            recorded_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_audit_subject ON audit_log(subject_id);
        CREATE INDEX IF NOT EXISTS idx_audit_kind ON audit_log(kind);
        CREATE INDEX IF NOT EXISTS idx_audit_time ON audit_log(recorded_at);

        CREATE TRIGGER IF NOT EXISTS audit_log_no_update
        BEFORE UPDATE ON audit_log
        BEGIN
            SELECT RAISE(ABORT, 'audit_log is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS audit_log_no_delete
        BEFORE DELETE ON audit_log
        BEGIN
            SELECT RAISE(ABORT, 'audit_log is append-only');
        END;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
