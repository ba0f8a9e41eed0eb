use serde::{Deserialize, Serialize};

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. `None` keeps everything in memory.
    pub db_path: Option<String>,
}
