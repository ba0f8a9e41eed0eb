use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::BastionResult;
use crate::models::{Collection, DocumentMetadata};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionDocument {
    pub source_id: String,
    pub text: String,
    pub collection: Collection,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// A feed polled by the periodic ingestion job.
#[async_trait]
pub trait IIngestionSource: Send + Sync {
    fn name(&self) -> &str;

    /// Documents new or changed since the last poll.
    async fn poll(&self) -> BastionResult<Vec<IngestionDocument>>;
}
