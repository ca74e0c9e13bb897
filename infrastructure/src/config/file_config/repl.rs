//! REPL configuration from TOML (`[repl]` section)

use serde::{Deserialize, Serialize};

/// Raw REPL configuration from TOML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show per-cycle progress bars while a chat runs
    pub show_progress: bool,
    /// History file; `~` expands to the home directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<String>,
    /// Entries kept in the history file
    pub history_size: usize,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            history_file: None,
            history_size: 1000,
        }
    }
}
