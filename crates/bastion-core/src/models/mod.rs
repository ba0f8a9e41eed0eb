mod audit;
mod embedding_info;
mod health_report;
mod knowledge;
mod routing;
mod session;
mod task;
mod task_result;

pub use audit::{AuditKind, AuditRecord};
pub use embedding_info::EmbeddingFingerprint;
pub use health_report::{HealthMetrics, HealthReport, HealthStatus, SubsystemHealth};
pub use knowledge::{
    Collection, CollectionStats, DocumentChunk, DocumentMetadata, KnowledgeStats, RetrievalMatch,
    RetrievalQuery, RetrievalResult, SourceDocument, TagMatch,
};
pub use routing::{AdapterSelection, RoutingDecision, TriggerSet};
pub use session::{FinalReport, Phase, PhaseRecord, Session, SessionStatus};
pub use task::Task;
pub use task_result::{CombinedResult, ResultStatus, TaskResult};
