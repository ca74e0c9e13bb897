//! Raw TOML configuration data types
//!
//! These structs mirror the config file layout. Every section is
//! `#[serde(default)]`, so a partial file (or none at all) still yields a
//! complete configuration. Conversion to domain types happens in
//! [`FileConfig::to_moa_config`] and [`FileConfig::to_execution_params`],
//! which collect [`ConfigIssue`]s instead of stopping at the first problem.

mod execution;
mod layer_agents;
mod logging;
mod models;
mod output;
mod providers;
mod repl;

pub use execution::FileExecutionConfig;
pub use layer_agents::{FileLayerAgentConfig, default_layer_agents};
pub use logging::FileLoggingConfig;
pub use models::FileModelsConfig;
pub use output::FileOutputConfig;
pub use providers::{ECHO_BACKEND, FileHttpBackendConfig, FileProvidersConfig};
pub use repl::FileReplConfig;

use moa_application::ExecutionParams;
use moa_domain::MoaConfig;
use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level tables understood by [`FileConfig`].
pub const KNOWN_SECTIONS: &[&str] = &[
    "models",
    "layer_agents",
    "prompts",
    "execution",
    "providers",
    "output",
    "repl",
    "logging",
];

const REDACTED: &str = "***";

/// Errors from loading or resolving the configuration file
#[derive(Error, Debug)]
pub enum FileConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid configuration: {}", summarize(.issues))]
    Invalid { issues: Vec<ConfigIssue> },
}

fn summarize(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Domain configuration that passed validation, plus its warnings
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub moa: MoaConfig,
    pub execution: ExecutionParams,
    pub warnings: Vec<ConfigIssue>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Main agent and cycle count
    pub models: FileModelsConfig,
    /// Ordered layer agents; replaces the built-in layer when present
    pub layer_agents: Vec<FileLayerAgentConfig>,
    /// Extra or overriding prompt templates by id
    pub prompts: BTreeMap<String, String>,
    /// Retry, chunking and failure policy
    pub execution: FileExecutionConfig,
    /// Backend selection and HTTP endpoints
    pub providers: FileProvidersConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Transcript and diagnostic log locations
    pub logging: FileLoggingConfig,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            models: FileModelsConfig::default(),
            layer_agents: default_layer_agents(),
            prompts: BTreeMap::new(),
            execution: FileExecutionConfig::default(),
            providers: FileProvidersConfig::default(),
            output: FileOutputConfig::default(),
            repl: FileReplConfig::default(),
            logging: FileLoggingConfig::default(),
        }
    }
}

impl FileConfig {
    /// Build the domain configuration.
    ///
    /// Fields that fail to parse keep their built-in value (or, for layer
    /// agents, are left out) and are reported as issues, together with
    /// everything [`MoaConfig::validate`] finds.
    pub fn to_moa_config(&self) -> (MoaConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut config = MoaConfig::default();

        let (main, main_issues) = self.models.parse_main();
        issues.extend(main_issues);
        if let Some(main) = main {
            config.main_model = main;
        }
        config.cycles = self.models.cycles;
        config.temperature = self.models.temperature;
        config.max_tokens = self.models.max_tokens;
        config.system_prompt = self.models.system_prompt.clone();
        config.reference_prompt = self.models.reference_prompt.clone();
        config.api_key = self.models.api_key();

        let mut agents = Vec::with_capacity(self.layer_agents.len());
        for (index, file_agent) in self.layer_agents.iter().enumerate() {
            let (agent, agent_issues) = file_agent.to_layer_agent(index);
            issues.extend(agent_issues);
            agents.extend(agent);
        }
        config.layer_agents = agents;

        for (id, text) in &self.prompts {
            config.prompts.insert(id.clone(), text.clone());
        }

        issues.extend(config.validate());
        (config, issues)
    }

    pub fn to_execution_params(&self) -> (ExecutionParams, Vec<ConfigIssue>) {
        self.execution.to_execution_params()
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Covers model and agent parsing, the domain rules of [`MoaConfig`],
    /// the `[execution]` values, the `[providers]` section and every
    /// explicit `backend/` prefix used by a model.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let (config, mut issues) = self.to_moa_config();
        issues.extend(self.to_execution_params().1);
        issues.extend(self.providers.validate());

        let known = self.providers.backend_names();
        for model in config.models() {
            if let Some(backend) = model.backend()
                && !known.contains(&backend)
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownBackend,
                    format!("model '{}': unknown backend '{}'", model, backend),
                ));
            }
        }

        issues
    }

    /// Convert to domain types, failing with every error found.
    pub fn resolve(&self) -> Result<ResolvedConfig, FileConfigError> {
        let issues = self.validate();
        let (errors, warnings): (Vec<_>, Vec<_>) =
            issues.into_iter().partition(ConfigIssue::is_error);
        if !errors.is_empty() {
            return Err(FileConfigError::Invalid { issues: errors });
        }

        Ok(ResolvedConfig {
            moa: self.to_moa_config().0,
            execution: self.to_execution_params().0,
            warnings,
        })
    }

    /// Copy with every API key masked.
    pub fn redacted(&self) -> Self {
        let mask = |key: &mut Option<String>| {
            if key.is_some() {
                *key = Some(REDACTED.to_string());
            }
        };

        let mut config = self.clone();
        mask(&mut config.models.api_key);
        for agent in &mut config.layer_agents {
            mask(&mut agent.api_key);
        }
        for backend in config.providers.http.values_mut() {
            mask(&mut backend.api_key);
        }
        config
    }

    /// Render as a TOML document with API keys masked.
    pub fn to_toml(&self) -> Result<String, FileConfigError> {
        Ok(toml::to_string_pretty(&self.redacted())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moa_domain::{LayerFailurePolicy, OutputFormat};

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[models]
main = "groq/llama3-70b-8192"
cycles = 2
temperature = 0.2
reference_prompt = "merge"

[[layer_agents]]
name = "fast"
model = "groq/llama-3.1-8b-instant"
temperature = 0.3

[[layer_agents]]
name = "creative"
model = "openai/gpt-4o-mini"
system_prompt = "creative"
temperature = 0.9
max_tokens = 512

[prompts]
merge = "Combine these:\n{helper_response}"
creative = "Be creative. {helper_response}"

[execution]
max_attempts = 2
on_layer_failure = "fail_fast"

[output]
format = "full"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_empty());

        let (moa, _) = config.to_moa_config();
        assert_eq!(moa.cycles, 2);
        assert_eq!(moa.main_model.to_string(), "groq/llama3-70b-8192");
        let names: Vec<_> = moa.layer_agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["fast", "creative"]);
        assert_eq!(moa.layer_agents[1].max_tokens, Some(512));
        assert!(moa.reference_template().is_ok());

        let (params, _) = config.to_execution_params();
        assert_eq!(params.retry.max_attempts, 2);
        assert_eq!(params.on_layer_failure, LayerFailurePolicy::FailFast);
        assert_eq!(config.output.format, OutputFormat::Full);
        assert!(!config.output.color);
    }

    #[test]
    fn test_deserialize_partial_config_keeps_defaults() {
        let toml_str = r#"
[models]
cycles = 1
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.models.cycles, 1);
        assert_eq!(config.models.main, "llama3-70b-8192");
        assert_eq!(config.layer_agents.len(), 3);
        assert!(config.output.color);
        assert!(config.repl.show_progress);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.moa, MoaConfig::default());
    }

    #[test]
    fn test_collects_every_problem() {
        let toml_str = r#"
[models]
main = ""
cycles = 0
reference_prompt = "plain"

[[layer_agents]]
name = "a"
model = "nowhere/model"
temperature = 3.0

[prompts]
plain = "no slot here"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        let codes: Vec<_> = issues.iter().map(|i| &i.code).collect();
        assert!(codes.contains(&&ConfigIssueCode::EmptyModelName));
        assert!(codes.contains(&&ConfigIssueCode::InvalidCycles));
        assert!(codes.contains(&&ConfigIssueCode::MissingMergeSlot));
        assert!(codes.contains(&&ConfigIssueCode::TemperatureOutOfRange));
        assert!(codes.contains(&&ConfigIssueCode::UnknownBackend));

        match config.resolve() {
            Err(FileConfigError::Invalid { issues }) => {
                assert!(issues.iter().all(ConfigIssue::is_error));
                assert!(issues.len() >= 5);
            }
            other => panic!("unexpected result: {:?}", other.map(|r| r.moa)),
        }
    }

    #[test]
    fn test_unknown_template_is_reported() {
        let toml_str = r#"
[[layer_agents]]
name = "a"
model = "m"
system_prompt = "missing"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let issues = config.validate();
        assert!(
            issues
                .iter()
                .any(|i| i.code == ConfigIssueCode::UnknownTemplate)
        );
    }

    #[test]
    fn test_duplicate_agent_names_are_reported() {
        let toml_str = r#"
[[layer_agents]]
name = "a"
model = "m1"

[[layer_agents]]
name = "a"
model = "m2"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert!(
            config
                .validate()
                .iter()
                .any(|i| i.code == ConfigIssueCode::DuplicateAgent)
        );
    }

    #[test]
    fn test_warnings_do_not_block_resolve() {
        let toml_str = r#"
[execution]
on_layer_failure = "whatever"
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let resolved = config.resolve().unwrap();
        assert_eq!(resolved.warnings.len(), 1);
        assert_eq!(
            resolved.execution.on_layer_failure,
            LayerFailurePolicy::Degrade
        );
    }

    #[test]
    fn test_to_toml_masks_keys_and_parses_back() {
        let mut config = FileConfig::default();
        config.models.api_key = Some("secret-main".to_string());
        config.layer_agents[0].api_key = Some("secret-agent".to_string());

        let rendered = config.to_toml().unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("[[layer_agents]]"));

        let parsed: FileConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.layer_agents.len(), 3);
        assert_eq!(parsed.models.api_key.as_deref(), Some("***"));
    }
}
