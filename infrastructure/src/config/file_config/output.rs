//! Output configuration from TOML (`[output]` section)

use moa_domain::OutputFormat;
use serde::{Deserialize, Serialize};

/// Raw output configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// `full` (every layer), `final` (answer only) or `json` (one event per line)
    pub format: OutputFormat,
    /// Enable colored terminal output
    pub color: bool,
    /// Stream the final answer to the terminal as it arrives
    pub stream: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color: true,
            stream: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_deserialize() {
        let toml_str = r#"
[output]
format = "json"
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.output.format, OutputFormat::Json);
        assert!(config.output.color);
    }
}
