//! # bastion-storage
//!
//! SQLite persistence for the three durable record kinds:
//! knowledge chunks keyed by `(collection, chunk_id)`, session transcripts,
//! and the audit log. Transcripts and audit rows are append-only and the
//! schema enforces it with triggers.

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod queries;

pub use engine::StorageEngine;

use bastion_core::errors::{BastionError, StorageError};

/// Convert any displayable SQLite error into a `BastionError`.
pub fn to_storage_err(message: String) -> BastionError {
    StorageError::SqliteError { message }.into()
}
