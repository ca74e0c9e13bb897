//! Agent and layer definitions
//!
//! These describe *what* an agent is (model, template, parameters); the
//! application layer binds them to a backend to make them invocable.

use super::value_objects::{ApiKey, GenerationParams};
use crate::config::ConfigError;
use crate::core::model::ModelRef;
use crate::prompt::PromptTemplate;

/// Static definition of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    pub model: ModelRef,
    pub template: PromptTemplate,
    pub params: GenerationParams,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, model: ModelRef, template: PromptTemplate) -> Self {
        Self {
            name: name.into(),
            model,
            template,
            params: GenerationParams::default(),
        }
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params.temperature = temperature;
        self
    }

    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.params.api_key = Some(key);
        self
    }
}

/// Ordered set of uniquely named agents run side by side in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSpec {
    agents: Vec<AgentSpec>,
}

impl LayerSpec {
    /// Build a layer, rejecting an empty agent list and duplicate names.
    pub fn new(agents: Vec<AgentSpec>) -> Result<Self, ConfigError> {
        if agents.is_empty() {
            return Err(ConfigError::EmptyLayer);
        }
        for (i, agent) in agents.iter().enumerate() {
            if agents[..i].iter().any(|a| a.name == agent.name) {
                return Err(ConfigError::DuplicateAgent(agent.name.clone()));
            }
        }
        Ok(Self { agents })
    }

    pub fn agents(&self) -> &[AgentSpec] {
        &self.agents
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.iter().map(|a| a.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> AgentSpec {
        AgentSpec::new(
            name,
            ModelRef::new("echo", "test"),
            PromptTemplate::new("t", "{input}"),
        )
    }

    #[test]
    fn test_layer_preserves_order() {
        let layer = LayerSpec::new(vec![spec("b"), spec("a"), spec("c")]).unwrap();
        assert_eq!(layer.names().collect::<Vec<_>>(), vec!["b", "a", "c"]);
        assert_eq!(layer.len(), 3);
    }

    #[test]
    fn test_layer_rejects_duplicates() {
        let err = LayerSpec::new(vec![spec("a"), spec("b"), spec("a")]).unwrap_err();
        assert_eq!(err, ConfigError::DuplicateAgent("a".to_string()));
    }

    #[test]
    fn test_layer_rejects_empty() {
        assert_eq!(LayerSpec::new(vec![]).unwrap_err(), ConfigError::EmptyLayer);
    }

    #[test]
    fn test_spec_builders() {
        let s = spec("a")
            .with_temperature(0.2)
            .with_api_key(ApiKey::new("k"));
        assert_eq!(s.params.temperature, 0.2);
        assert!(s.params.api_key.is_some());
    }
}
