use async_trait::async_trait;

use crate::errors::BastionResult;
use crate::models::AuditRecord;

/// Append-only destination for audit records.
#[async_trait]
pub trait IAuditSink: Send + Sync {
    async fn record(&self, record: AuditRecord) -> BastionResult<()>;
}
