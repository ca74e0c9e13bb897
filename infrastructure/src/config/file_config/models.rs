//! Main agent configuration from TOML (`[models]` section)

use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use moa_domain::{ApiKey, ConfigError, ModelRef, MoaConfig};
use serde::{Deserialize, Serialize};

/// Main (final-stage) agent and cycle settings
///
/// # Example
///
/// ```toml
/// [models]
/// main = "groq/llama3-70b-8192"   # backend/model, or a bare name
/// cycles = 3
/// temperature = 0.1
/// max_tokens = 2048
/// system_prompt = "default"       # template id from [prompts]
/// reference_prompt = "reference"  # must contain {helper_response}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelsConfig {
    /// Model for the final synthesis stage
    pub main: String,
    /// Number of layer cycles before the final stage
    pub cycles: usize,
    /// Sampling temperature of the main agent
    pub temperature: f32,
    /// Completion limit of the main agent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Template id used as the main agent's system prompt
    pub system_prompt: String,
    /// Template id used to merge layer outputs
    pub reference_prompt: String,
    /// Key passed to the main agent's backend (prefer the provider's env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FileModelsConfig {
    fn default() -> Self {
        let config = MoaConfig::default();
        Self {
            main: config.main_model.to_string(),
            cycles: config.cycles,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt,
            reference_prompt: config.reference_prompt,
            api_key: None,
        }
    }
}

impl FileModelsConfig {
    /// Parse the main model, collecting an issue when it is malformed.
    pub fn parse_main(&self) -> (Option<ModelRef>, Vec<ConfigIssue>) {
        parse_model("models.main", &self.main)
    }

    pub fn api_key(&self) -> Option<ApiKey> {
        non_empty_key(self.api_key.as_deref())
    }
}

/// Parse a `backend/model` string, reporting `field` on failure.
pub(crate) fn parse_model(field: &str, value: &str) -> (Option<ModelRef>, Vec<ConfigIssue>) {
    match value.parse::<ModelRef>() {
        Ok(model) => (Some(model), Vec::new()),
        Err(ConfigError::EmptyModelName) => (
            None,
            vec![ConfigIssue::error(
                ConfigIssueCode::EmptyModelName,
                format!("{}: model name cannot be empty", field),
            )],
        ),
        Err(e) => (
            None,
            vec![ConfigIssue::error(
                ConfigIssueCode::InvalidModel,
                format!("{}: {}", field, e),
            )],
        ),
    }
}

pub(crate) fn non_empty_key(value: Option<&str>) -> Option<ApiKey> {
    value
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(ApiKey::new)
}
