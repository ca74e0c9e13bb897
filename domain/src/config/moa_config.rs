//! Validated orchestrator configuration
//!
//! [`MoaConfig`] is what the rest of the system builds agents and layers
//! from. The infrastructure crate produces it from files and environment;
//! tests and embedders can construct it directly.

use super::error::ConfigError;
use super::validation::{ConfigIssue, ConfigIssueCode};
use crate::agent::{AgentSpec, ApiKey, GenerationParams, LayerSpec};
use crate::context::slots;
use crate::core::model::ModelRef;
use crate::prompt::{DEFAULT_REFERENCE_ID, DEFAULT_SYSTEM_ID, PromptLibrary, PromptTemplate};

/// Name the final synthesis agent carries in logs and events.
pub const MAIN_AGENT_NAME: &str = "main";

/// One entry of the layer table.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerAgentConfig {
    pub name: String,
    /// Template id looked up in [`MoaConfig::prompts`].
    pub system_prompt: String,
    pub model: ModelRef,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub api_key: Option<ApiKey>,
}

impl LayerAgentConfig {
    pub fn new(name: impl Into<String>, model: ModelRef, temperature: f32) -> Self {
        Self {
            name: name.into(),
            system_prompt: DEFAULT_SYSTEM_ID.to_string(),
            model,
            temperature,
            max_tokens: None,
            api_key: None,
        }
    }

    pub fn with_system_prompt(mut self, id: impl Into<String>) -> Self {
        self.system_prompt = id.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            api_key: self.api_key.clone(),
        }
    }
}

/// Complete description of one orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct MoaConfig {
    /// Model of the final synthesis agent.
    pub main_model: ModelRef,
    /// Number of layer cycles before the final agent runs.
    pub cycles: usize,
    /// Temperature of the final agent.
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Template id of the final agent's system prompt.
    pub system_prompt: String,
    /// Template id used to merge a layer's outputs.
    pub reference_prompt: String,
    /// Layer agents in configuration order.
    pub layer_agents: Vec<LayerAgentConfig>,
    pub prompts: PromptLibrary,
    pub api_key: Option<ApiKey>,
}

impl Default for MoaConfig {
    fn default() -> Self {
        Self {
            main_model: ModelRef::bare("llama3-70b-8192"),
            cycles: 3,
            temperature: 0.1,
            max_tokens: None,
            system_prompt: DEFAULT_SYSTEM_ID.to_string(),
            reference_prompt: DEFAULT_REFERENCE_ID.to_string(),
            layer_agents: vec![
                LayerAgentConfig::new("layer_agent_1", ModelRef::bare("llama-3.1-8b-instant"), 0.3),
                LayerAgentConfig::new("layer_agent_2", ModelRef::bare("gemma2-9b-it"), 0.7),
                LayerAgentConfig::new(
                    "layer_agent_3",
                    ModelRef::bare("llama-3.1-70b-versatile"),
                    0.1,
                ),
            ],
            prompts: PromptLibrary::builtin(),
            api_key: None,
        }
    }
}

impl MoaConfig {
    pub fn with_main_model(mut self, model: ModelRef) -> Self {
        self.main_model = model;
        self
    }

    pub fn with_cycles(mut self, cycles: usize) -> Self {
        self.cycles = cycles;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_layer_agents(mut self, agents: Vec<LayerAgentConfig>) -> Self {
        self.layer_agents = agents;
        self
    }

    pub fn with_prompt(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.prompts.insert(id, text);
        self
    }

    pub fn with_reference_prompt(mut self, id: impl Into<String>) -> Self {
        self.reference_prompt = id.into();
        self
    }

    /// Every model the configuration refers to, final agent first.
    pub fn models(&self) -> impl Iterator<Item = &ModelRef> {
        std::iter::once(&self.main_model).chain(self.layer_agents.iter().map(|a| &a.model))
    }

    /// The final synthesis agent.
    pub fn main_agent_spec(&self) -> Result<AgentSpec, ConfigError> {
        check_temperature(MAIN_AGENT_NAME, self.temperature)?;
        let template = self.prompts.resolve(&self.system_prompt)?;
        Ok(AgentSpec::new(MAIN_AGENT_NAME, self.main_model.clone(), template).with_params(
            GenerationParams {
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                api_key: self.api_key.clone(),
            },
        ))
    }

    /// The layer run on every cycle.
    pub fn layer_spec(&self) -> Result<LayerSpec, ConfigError> {
        let agents = self
            .layer_agents
            .iter()
            .map(|agent| {
                check_temperature(&agent.name, agent.temperature)?;
                let template = self.prompts.resolve(&agent.system_prompt)?;
                Ok(AgentSpec::new(agent.name.clone(), agent.model.clone(), template)
                    .with_params(agent.params()))
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;
        LayerSpec::new(agents)
    }

    /// Template used to merge layer outputs; it must read `{helper_response}`.
    pub fn reference_template(&self) -> Result<PromptTemplate, ConfigError> {
        let template = self.prompts.resolve(&self.reference_prompt)?;
        if !template.has_slot(slots::HELPER_RESPONSE) {
            return Err(ConfigError::MissingMergeSlot(self.reference_prompt.clone()));
        }
        Ok(template)
    }

    /// Fail with the first error-level problem.
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match self.errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// All problems, errors first.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues: Vec<ConfigIssue> = self.errors().iter().map(ConfigIssue::from).collect();

        if self.cycles > 1 {
            for agent in &self.layer_agents {
                if let Some(template) = self.prompts.get(&agent.system_prompt)
                    && !template.has_slot(slots::HELPER_RESPONSE)
                {
                    issues.push(ConfigIssue::warning(
                        ConfigIssueCode::HelperResponseUnused,
                        format!(
                            "layer agent '{}' uses template '{}' without {{helper_response}}; \
                             it will not see earlier cycles",
                            agent.name, agent.system_prompt
                        ),
                    ));
                }
            }
        }

        issues
    }

    fn errors(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.cycles < 1 {
            errors.push(ConfigError::InvalidCycles);
        }
        for model in self.models() {
            if model.name().trim().is_empty() {
                errors.push(ConfigError::EmptyModelName);
            }
        }
        if let Err(e) = check_temperature(MAIN_AGENT_NAME, self.temperature) {
            errors.push(e);
        }
        if let Err(e) = self.prompts.resolve(&self.system_prompt) {
            errors.push(e);
        }
        if let Err(e) = self.reference_template() {
            errors.push(e);
        }

        if self.layer_agents.is_empty() {
            errors.push(ConfigError::EmptyLayer);
        }
        for (i, agent) in self.layer_agents.iter().enumerate() {
            if self.layer_agents[..i].iter().any(|a| a.name == agent.name) {
                errors.push(ConfigError::DuplicateAgent(agent.name.clone()));
            }
            if let Err(e) = check_temperature(&agent.name, agent.temperature) {
                errors.push(e);
            }
            if let Err(e) = self.prompts.resolve(&agent.system_prompt) {
                errors.push(e);
            }
        }

        errors
    }
}

fn check_temperature(agent: &str, value: f32) -> Result<(), ConfigError> {
    if GenerationParams::new(value).temperature_in_range() {
        Ok(())
    } else {
        Err(ConfigError::TemperatureOutOfRange {
            target: format!("agent '{}'", agent),
            value,
        })
    }
}
