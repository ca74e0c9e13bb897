//! Named prompt templates

use super::template::PromptTemplate;
use crate::config::ConfigError;
use std::collections::BTreeMap;

/// Id of the built-in system template used by agents.
pub const DEFAULT_SYSTEM_ID: &str = "default";
/// Id of the built-in reference (merge) template.
pub const DEFAULT_REFERENCE_ID: &str = "reference";

const DEFAULT_SYSTEM: &str = r#"You are a helpful assistant working as part of a group of agents.
Answer the user's latest message as well as you can.

Conversation so far:
{history}

{helper_response}"#;

const DEFAULT_REFERENCE: &str = r#"You have been provided with a set of responses from various agents to the latest user query.
Your task is to synthesize these responses into a single, high-quality response.
Critically evaluate the information provided, recognizing that some of it may be biased or incorrect.
Do not simply replicate the given answers; offer a refined, accurate and comprehensive reply.

Responses from agents:
{helper_response}"#;

/// Lookup table from template id to [`PromptTemplate`].
///
/// Always contains the built-in `default` and `reference` templates;
/// configuration may add more or override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptLibrary {
    templates: BTreeMap<String, PromptTemplate>,
}

impl PromptLibrary {
    /// Library holding only the built-in templates.
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            DEFAULT_SYSTEM_ID.to_string(),
            PromptTemplate::new(DEFAULT_SYSTEM_ID, DEFAULT_SYSTEM),
        );
        templates.insert(
            DEFAULT_REFERENCE_ID.to_string(),
            PromptTemplate::new(DEFAULT_REFERENCE_ID, DEFAULT_REFERENCE),
        );
        Self { templates }
    }

    /// Add or replace a template.
    pub fn insert(&mut self, id: impl Into<String>, text: impl Into<String>) {
        let id = id.into();
        self.templates
            .insert(id.clone(), PromptTemplate::new(id, text));
    }

    pub fn with(mut self, id: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(id, text);
        self
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    /// Resolve a template id, failing on unknown ids.
    pub fn resolve(&self, id: &str) -> Result<PromptTemplate, ConfigError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownTemplate(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::builtin()
    }
}
