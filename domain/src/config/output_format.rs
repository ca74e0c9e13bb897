//! Output format value object

use serde::{Deserialize, Serialize};

/// How chat results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every layer's outputs, then the final answer
    Full,
    /// Only the final answer (default)
    #[default]
    Final,
    /// One JSON event per line
    Json,
}
