//! Versioned schema migrations, applied in order and recorded in
//! `schema_version`.

mod v001_chunk_tables;
mod v002_session_tables;
mod v003_audit_tables;

use rusqlite::Connection;
use tracing::info;

use bastion_core::errors::{BastionResult, StorageError};

use crate::to_storage_err;

type MigrationFn = fn(&Connection) -> BastionResult<()>;

const MIGRATIONS: &[(u32, &str, MigrationFn)] = &[
    (1, "chunk_tables", v001_chunk_tables::migrate),
    (2, "session_tables", v002_session_tables::migrate),
    (3, "audit_tables", v003_audit_tables::migrate),
];

pub const LATEST_VERSION: u32 = 3;

pub fn current_version(conn: &Connection) -> BastionResult<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn run_migrations(conn: &Connection) -> BastionResult<u32> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version    INTEGER PRIMARY KEY,
            name       TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;

    let applied = current_version(conn)?;
    for (version, name, migrate) in MIGRATIONS.iter().filter(|(v, _, _)| *v > applied) {
        migrate(conn).map_err(|e| StorageError::MigrationFailed {
            version: *version,
            reason: e.to_string(),
        })?;
        conn.execute(
            "INSERT INTO schema_version (version, name) VALUES (?1, ?2)",
            rusqlite::params![version, name],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        info!(version, name, "applied migration");
    }
    current_version(conn)
}
