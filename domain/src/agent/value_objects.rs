//! Agent value objects

use serde::{Deserialize, Serialize};

/// Per-request parameters passed to the backend with every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Sampling temperature in `[0, 1]`.
    pub temperature: f32,
    /// Optional cap on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Credential overriding the backend's own, if any.
    #[serde(skip)]
    pub api_key: Option<ApiKey>,
}

impl GenerationParams {
    pub fn new(temperature: f32) -> Self {
        Self {
            temperature,
            max_tokens: None,
            api_key: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_api_key(mut self, key: ApiKey) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn temperature_in_range(&self) -> bool {
        (0.0..=1.0).contains(&self.temperature)
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::new(0.7)
    }
}

/// Provider credential carried by an agent. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}
