//! Logging configuration from TOML (`[logging]` section)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL transcript of every chat (merged cycles, failures, answers)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<String>,
    /// Directory for daily-rolling diagnostic logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<String>,
}
