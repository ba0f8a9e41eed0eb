use serde::{Deserialize, Serialize};

use super::defaults;

/// How an adapter reaches its reasoning engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// JSON over HTTP.
    Http,
    /// JSON over a child process's stdin/stdout.
    Command,
    /// No backend configured; the adapter reports unavailable.
    #[default]
    None,
}

/// One adapter's backend wiring.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub enabled: bool,
    pub backend: BackendKind,
    /// Base URL for `Http` backends.
    pub endpoint: Option<String>,
    /// Path requested by `is_available` on `Http` backends.
    pub health_path: String,
    /// Program for `Command` backends.
    pub program: Option<String>,
    pub args: Vec<String>,
    /// Trigger terms appended to the adapter's built-in set.
    pub extra_triggers: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: BackendKind::None,
            endpoint: None,
            health_path: defaults::DEFAULT_HEALTH_PATH.to_string(),
            program: None,
            args: Vec::new(),
            extra_triggers: Vec::new(),
        }
    }
}

/// Backend wiring for every built-in adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptersConfig {
    pub pentest_reasoning: AdapterConfig,
    pub tool_execution: AdapterConfig,
    pub general_reasoning: AdapterConfig,
    /// The knowledge adapter needs no backend, only `enabled` and triggers apply.
    pub knowledge: AdapterConfig,
}
