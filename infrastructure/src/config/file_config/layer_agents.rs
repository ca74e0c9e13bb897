//! Layer agent configuration from TOML (`[[layer_agents]]` array)
//!
//! An array of tables keeps the agents in file order, which is the order
//! their outputs are numbered in the merged helper response.

use super::models::{non_empty_key, parse_model};
use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use moa_domain::{LayerAgentConfig, MoaConfig};
use serde::{Deserialize, Serialize};

/// One layer agent
///
/// # Example
///
/// ```toml
/// [[layer_agents]]
/// name = "layer_agent_1"
/// model = "groq/llama-3.1-8b-instant"
/// system_prompt = "default"
/// temperature = 0.3
/// max_tokens = 512
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLayerAgentConfig {
    pub name: String,
    pub model: String,
    /// Template id from `[prompts]` or a built-in one
    pub system_prompt: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for FileLayerAgentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            model: String::new(),
            system_prompt: moa_domain::prompt::DEFAULT_SYSTEM_ID.to_string(),
            temperature: 0.7,
            max_tokens: None,
            api_key: None,
        }
    }
}

impl From<&LayerAgentConfig> for FileLayerAgentConfig {
    fn from(agent: &LayerAgentConfig) -> Self {
        Self {
            name: agent.name.clone(),
            model: agent.model.to_string(),
            system_prompt: agent.system_prompt.clone(),
            temperature: agent.temperature,
            max_tokens: agent.max_tokens,
            api_key: None,
        }
    }
}

impl FileLayerAgentConfig {
    /// Convert to the domain form. `index` is the 0-based position in the
    /// array and only used for messages.
    pub fn to_layer_agent(&self, index: usize) -> (Option<LayerAgentConfig>, Vec<ConfigIssue>) {
        let name = self.name.trim();
        if name.is_empty() {
            return (
                None,
                vec![ConfigIssue::error(
                    ConfigIssueCode::Other,
                    format!("layer_agents[{}]: name cannot be empty", index),
                )],
            );
        }

        let field = format!("layer_agents.{}.model", name);
        let (model, issues) = parse_model(&field, &self.model);
        let Some(model) = model else {
            return (None, issues);
        };

        let mut agent = LayerAgentConfig::new(name, model, self.temperature)
            .with_system_prompt(self.system_prompt.clone());
        if let Some(max_tokens) = self.max_tokens {
            agent = agent.with_max_tokens(max_tokens);
        }
        agent.api_key = non_empty_key(self.api_key.as_deref());
        (Some(agent), issues)
    }
}

/// The built-in layer, as written in a config file.
pub fn default_layer_agents() -> Vec<FileLayerAgentConfig> {
    MoaConfig::default()
        .layer_agents
        .iter()
        .map(FileLayerAgentConfig::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layer_matches_domain() {
        let agents = default_layer_agents();
        let names: Vec<_> = agents.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["layer_agent_1", "layer_agent_2", "layer_agent_3"]);
        assert_eq!(agents[1].model, "gemma2-9b-it");
        assert_eq!(agents[1].temperature, 0.7);
    }

    #[test]
    fn test_to_layer_agent() {
        let file = FileLayerAgentConfig {
            name: "critic".to_string(),
            model: "echo/critic".to_string(),
            system_prompt: "strict".to_string(),
            temperature: 0.2,
            max_tokens: Some(256),
            api_key: None,
        };
        let (agent, issues) = file.to_layer_agent(0);
        assert!(issues.is_empty());
        let agent = agent.unwrap();
        assert_eq!(agent.name, "critic");
        assert_eq!(agent.model.backend(), Some("echo"));
        assert_eq!(agent.system_prompt, "strict");
        assert_eq!(agent.max_tokens, Some(256));
    }

    #[test]
    fn test_missing_name_is_error() {
        let file = FileLayerAgentConfig {
            model: "m".to_string(),
            ..Default::default()
        };
        let (agent, issues) = file.to_layer_agent(2);
        assert!(agent.is_none());
        assert!(issues[0].is_error());
        assert!(issues[0].message.contains("layer_agents[2]"));
    }

    #[test]
    fn test_missing_model_is_error() {
        let file = FileLayerAgentConfig {
            name: "a".to_string(),
            ..Default::default()
        };
        let (agent, issues) = file.to_layer_agent(0);
        assert!(agent.is_none());
        assert_eq!(issues[0].code, ConfigIssueCode::EmptyModelName);
        assert!(issues[0].message.contains("layer_agents.a.model"));
    }
}
