//! Backend configuration from TOML (`[providers]` section)

use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the always-available offline backend.
pub const ECHO_BACKEND: &str = "echo";

/// One OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHttpBackendConfig {
    /// Base URL up to and including the API version, e.g. `https://api.groq.com/openai/v1`.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Direct API key (not recommended, use the env var instead).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for FileHttpBackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key_env: String::new(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl FileHttpBackendConfig {
    fn preset(base_url: &str, api_key_env: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key_env: api_key_env.to_string(),
            ..Default::default()
        }
    }

    /// Key from the config file, else from `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                if self.api_key_env.is_empty() {
                    return None;
                }
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
    }
}

/// Backend selection
///
/// # Example
///
/// ```toml
/// [providers]
/// default = "groq"
///
/// [providers.routing]
/// "gpt-4o-mini" = "openai"
///
/// [providers.http.together]
/// base_url = "https://api.together.xyz/v1"
/// api_key_env = "TOGETHER_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProvidersConfig {
    /// Backend for model names written without a `backend/` prefix.
    pub default: String,
    /// Explicit model name to backend overrides for bare names.
    pub routing: BTreeMap<String, String>,
    /// OpenAI-compatible endpoints by backend name.
    pub http: BTreeMap<String, FileHttpBackendConfig>,
}

impl Default for FileProvidersConfig {
    fn default() -> Self {
        let mut http = BTreeMap::new();
        http.insert(
            "groq".to_string(),
            FileHttpBackendConfig::preset("https://api.groq.com/openai/v1", "GROQ_API_KEY"),
        );
        http.insert(
            "openai".to_string(),
            FileHttpBackendConfig::preset("https://api.openai.com/v1", "OPENAI_API_KEY"),
        );
        Self {
            default: "groq".to_string(),
            routing: BTreeMap::new(),
            http,
        }
    }
}

impl FileProvidersConfig {
    /// Every backend name this section can produce.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.http.keys().map(String::as_str).collect();
        if !self.http.contains_key(ECHO_BACKEND) {
            names.push(ECHO_BACKEND);
        }
        names
    }

    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        let known = self.backend_names();

        if !known.contains(&self.default.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::UnknownBackend,
                format!(
                    "providers.default: unknown backend '{}' (known: {})",
                    self.default,
                    known.join(", ")
                ),
            ));
        }

        for (model, backend) in &self.routing {
            if !known.contains(&backend.as_str()) {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownBackend,
                    format!(
                        "providers.routing.\"{}\": unknown backend '{}'",
                        model, backend
                    ),
                ));
            }
        }

        for (name, backend) in &self.http {
            if backend.base_url.trim().is_empty() {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::Other,
                    format!("providers.http.{}: base_url cannot be empty", name),
                ));
            }
            if name == ECHO_BACKEND {
                issues.push(ConfigIssue::warning(
                    ConfigIssueCode::Other,
                    format!(
                        "providers.http.{}: shadows the built-in echo backend",
                        name
                    ),
                ));
            }
        }

        issues
    }
}
