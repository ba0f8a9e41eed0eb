//! knowledge_chunks and embedding_fingerprint queries.

use rusqlite::{params, Connection, OptionalExtension};

use bastion_core::errors::BastionResult;
use bastion_core::models::{Collection, DocumentChunk, DocumentMetadata, EmbeddingFingerprint};

use super::{corrupt, parse_ts};
use crate::to_storage_err;

const TABLE: &str = "knowledge_chunks";

pub fn encode_embedding(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

pub fn decode_embedding(bytes: &[u8]) -> BastionResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(corrupt(TABLE, format!("embedding blob of {} bytes", bytes.len())));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn decode_metadata(raw: &str) -> BastionResult<DocumentMetadata> {
    serde_json::from_str(raw).map_err(|e| corrupt(TABLE, format!("bad metadata {raw:?}: {e}")))
}

/// Delete the source's rows and insert `chunks`, all in one transaction.
pub fn replace_source(
    conn: &Connection,
    source_id: &str,
    chunks: &[DocumentChunk],
) -> BastionResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;
    tx.execute(
        "DELETE FROM knowledge_chunks WHERE source_id = ?1",
        params![source_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    {
        let mut stmt = tx
            .prepare_cached(
                "INSERT INTO knowledge_chunks
                 (collection, chunk_id, source_id, text, embedding, offset_in_source,
                  ingested_at, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )
            .map_err(|e| to_storage_err(e.to_string()))?;
        for chunk in chunks {
            let metadata = serde_json::to_string(&chunk.metadata)
                .map_err(|e| to_storage_err(e.to_string()))?;
            stmt.execute(params![
                chunk.collection.as_str(),
                chunk.chunk_id,
                chunk.source_id,
                chunk.text,
                encode_embedding(&chunk.embedding_vector),
                chunk.offset_in_source as i64,
                chunk.ingested_at.to_rfc3339(),
                metadata,
            ])
            .map_err(|e| to_storage_err(e.to_string()))?;
        }
    }
    tx.commit().map_err(|e| to_storage_err(e.to_string()))
}

pub fn delete_source(conn: &Connection, source_id: &str) -> BastionResult<usize> {
    conn.execute(
        "DELETE FROM knowledge_chunks WHERE source_id = ?1",
        params![source_id],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn delete_collection(conn: &Connection, collection: Collection) -> BastionResult<usize> {
    conn.execute(
        "DELETE FROM knowledge_chunks WHERE collection = ?1",
        params![collection.as_str()],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn delete_all(conn: &Connection) -> BastionResult<usize> {
    conn.execute("DELETE FROM knowledge_chunks", [])
        .map_err(|e| to_storage_err(e.to_string()))
}

pub fn count_chunks(conn: &Connection) -> BastionResult<usize> {
    conn.query_row("SELECT COUNT(*) FROM knowledge_chunks", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n as usize)
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn load_all(conn: &Connection) -> BastionResult<Vec<DocumentChunk>> {
    let mut stmt = conn
        .prepare(
            "SELECT collection, chunk_id, source_id, text, embedding, offset_in_source,
                    ingested_at, metadata
             FROM knowledge_chunks
             ORDER BY source_id, offset_in_source",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut chunks = Vec::new();
    for row in rows {
        let (collection, chunk_id, source_id, text, blob, offset, ingested_at, metadata) =
            row.map_err(|e| to_storage_err(e.to_string()))?;
        let collection: Collection = collection
            .parse()
            .map_err(|_| corrupt(TABLE, format!("unknown collection {collection:?}")))?;
        chunks.push(DocumentChunk {
            chunk_id,
            collection,
            source_id,
            text,
            embedding_vector: decode_embedding(&blob)?,
            offset_in_source: offset.max(0) as usize,
            ingested_at: parse_ts(TABLE, &ingested_at)?,
            metadata: decode_metadata(&metadata)?,
        });
    }
    Ok(chunks)
}

pub fn load_fingerprint(conn: &Connection) -> BastionResult<Option<EmbeddingFingerprint>> {
    conn.query_row(
        "SELECT provider, model, dimensions, digest FROM embedding_fingerprint WHERE id = 1",
        [],
        |row| {
            Ok(EmbeddingFingerprint {
                provider: row.get(0)?,
                model: row.get(1)?,
                dimensions: row.get::<_, i64>(2)?.max(0) as usize,
                digest: row.get(3)?,
            })
        },
    )
    .optional()
    .map_err(|e| to_storage_err(e.to_string()))
}

pub fn store_fingerprint(conn: &Connection, fp: &EmbeddingFingerprint) -> BastionResult<()> {
    conn.execute(
        "INSERT INTO embedding_fingerprint (id, provider, model, dimensions, digest)
         VALUES (1, ?1, ?2, ?3, ?4)
         ON CONFLICT(id) DO UPDATE SET
            provider = excluded.provider,
            model = excluded.model,
            dimensions = excluded.dimensions,
            digest = excluded.digest,
            recorded_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
        params![fp.provider, fp.model, fp.dimensions as i64, fp.digest],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
