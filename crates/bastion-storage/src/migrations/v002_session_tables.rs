//! v002: sessions, phase_records (append-only).

use rusqlite::Connection;

use bastion_core::errors::BastionResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> BastionResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS sessions (
            session_id        TEXT PRIMARY KEY,
            target_descriptor TEXT NOT NULL,
            status            TEXT NOT NULL,
            created_at        TEXT NOT NULL,
            updated_at        TEXT NOT NULL,
            closed_reason     TEXT,
            final_report      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);

        CREATE TABLE IF NOT EXISTS phase_records (
            session_id      TEXT NOT NULL,
            seq             INTEGER NOT NULL,
            phase_name      TEXT NOT NULL,
            input_directive TEXT NOT NULL,
            output_analysis TEXT NOT NULL,
            skipped         INTEGER NOT NULL DEFAULT 0,
            recorded_at     TEXT NOT NULL,
            PRIMARY KEY (session_id, seq),
            FOREIGN KEY (session_id) REFERENCES sessions(session_id)
        );

        CREATE TRIGGER IF NOT EXISTS phase_records_no_update
        BEFORE UPDATE ON phase_records
        BEGIN
            SELECT RAISE(ABORT, 'phase_records is append-only');
        END;

        CREATE TRIGGER IF NOT EXISTS phase_records_no_delete
        BEFORE DELETE ON phase_records
        BEGIN
            SELECT RAISE(ABORT, 'phase_records is append-only');
        END;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
