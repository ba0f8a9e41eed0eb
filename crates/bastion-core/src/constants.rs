/// Bastion version string.
pub const BASTION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Adapter names. The router, the registry, and the fallback config all refer
/// to adapters by these names.
pub const ADAPTER_PENTEST: &str = "pentest_reasoning";
pub const ADAPTER_TOOLS: &str = "tool_execution";
pub const ADAPTER_GENERAL: &str = "general_reasoning";
pub const ADAPTER_KNOWLEDGE: &str = "knowledge";

/// Task categories, reported as `CombinedResult::task_type`.
pub const CATEGORY_PENETRATION_TESTING: &str = "penetration_testing";
pub const CATEGORY_RECONNAISSANCE: &str = "reconnaissance";
pub const CATEGORY_INTELLIGENCE: &str = "intelligence_gathering";
pub const CATEGORY_ANALYSIS: &str = "document_analysis";
pub const CATEGORY_GENERAL: &str = "general";

/// Well-known task context keys.
pub const CTX_TARGET: &str = "target";
pub const CTX_QUERY: &str = "query";
pub const CTX_FILE_PATH: &str = "file_path";
pub const CTX_COLLECTION: &str = "collection";
pub const CTX_PHASE: &str = "phase";
pub const CTX_TRANSCRIPT: &str = "transcript";

/// Payload reason keys.
pub const PAYLOAD_REASON: &str = "reason";
pub const PAYLOAD_DETAIL: &str = "detail";

/// Similarity scores for non-identical texts never reach this value.
pub const MAX_NON_EXACT_SCORE: f64 = 0.999_999;
