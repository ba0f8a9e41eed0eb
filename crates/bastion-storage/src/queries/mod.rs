pub mod audit_ops;
pub mod chunk_ops;
pub mod session_ops;

use chrono::{DateTime, Utc};

use bastion_core::errors::{BastionResult, StorageError};

pub(crate) fn parse_ts(table: &str, raw: &str) -> BastionResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            StorageError::CorruptRow {
                table: table.to_string(),
                details: format!("bad timestamp {raw:?}: {e}"),
            }
            .into()
        })
}

pub(crate) fn corrupt(table: &str, details: impl Into<String>) -> bastion_core::BastionError {
    StorageError::CorruptRow {
        table: table.to_string(),
        details: details.into(),
    }
    .into()
}
