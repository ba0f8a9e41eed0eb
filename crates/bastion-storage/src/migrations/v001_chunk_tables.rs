//! v001: knowledge_chunks, embedding_fingerprint.

use rusqlite::Connection;

use bastion_core::errors::BastionResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> BastionResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS knowledge_chunks (
            collection       TEXT NOT NULL,
            chunk_id         TEXT NOT NULL,
            source_id        TEXT NOT NULL,
            text             TEXT NOT NULL,
            embedding        BLOB NOT NULL,
            offset_in_source INTEGER NOT NULL,
            ingested_at      TEXT NOT NULL,
            metadata         TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (collection, chunk_id)
        );

        CREATE INDEX IF NOT EXISTS idx_chunks_source ON knowledge_chunks(source_id);

        CREATE TABLE IF NOT EXISTS embedding_fingerprint (
            id          INTEGER PRIMARY KEY CHECK (id = 1),
            provider    TEXT NOT NULL,
            model       TEXT NOT NULL,
            dimensions  INTEGER NOT NULL,
            digest      TEXT NOT NULL,
            recorded_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
