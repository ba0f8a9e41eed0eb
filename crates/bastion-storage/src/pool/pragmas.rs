//! PRAGMA configuration applied to every SQLite connection.

use rusqlite::Connection;

use bastion_core::errors::BastionResult;

use crate::to_storage_err;

pub fn apply_pragmas(conn: &Connection) -> BastionResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        PRAGMA foreign_keys = ON;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
