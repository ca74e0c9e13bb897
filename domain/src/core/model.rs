//! Model reference value object

use crate::config::ConfigError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Reference to a model served by a backend (Value Object)
///
/// Written as `backend/model-name`, e.g. `groq/llama-3.1-70b-versatile`.
/// Only the first `/` separates the backend, so model names that contain
/// slashes themselves (`openrouter/meta-llama/llama-3-8b`) survive intact.
/// A bare name has no backend and is routed to the registry's default.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    backend: Option<String>,
    name: String,
}

impl ModelRef {
    /// Create a reference with an explicit backend.
    pub fn new(backend: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            backend: Some(backend.into()),
            name: name.into(),
        }
    }

    /// Create a reference without a backend selector.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            backend: None,
            name: name.into(),
        }
    }

    /// The backend selector, if one was given.
    pub fn backend(&self) -> Option<&str> {
        self.backend.as_deref()
    }

    /// The model name passed through to the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return a copy routed to `backend` when no backend was specified.
    pub fn or_backend(&self, backend: &str) -> Self {
        match self.backend {
            Some(_) => self.clone(),
            None => Self::new(backend, self.name.clone()),
        }
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.backend {
            Some(backend) => write!(f, "{}/{}", backend, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl std::str::FromStr for ModelRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        match s.split_once('/') {
            Some((backend, name)) => {
                if backend.is_empty() || name.is_empty() {
                    return Err(ConfigError::InvalidModel(s.to_string()));
                }
                Ok(Self::new(backend, name))
            }
            None => Ok(Self::bare(s)),
        }
    }
}

impl Serialize for ModelRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ModelRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_backend() {
        let model: ModelRef = "groq/llama3-70b-8192".parse().unwrap();
        assert_eq!(model.backend(), Some("groq"));
        assert_eq!(model.name(), "llama3-70b-8192");
        assert_eq!(model.to_string(), "groq/llama3-70b-8192");
    }

    #[test]
    fn test_parse_bare_name() {
        let model: ModelRef = "gemma2-9b-it".parse().unwrap();
        assert_eq!(model.backend(), None);
        assert_eq!(model.to_string(), "gemma2-9b-it");
        assert_eq!(model.or_backend("groq").to_string(), "groq/gemma2-9b-it");
    }

    #[test]
    fn test_only_first_slash_splits() {
        let model: ModelRef = "openrouter/meta-llama/llama-3-8b".parse().unwrap();
        assert_eq!(model.backend(), Some("openrouter"));
        assert_eq!(model.name(), "meta-llama/llama-3-8b");
    }

    #[test]
    fn test_explicit_backend_is_kept() {
        let model = ModelRef::new("echo", "test");
        assert_eq!(model.or_backend("groq"), model);
    }

    #[test]
    fn test_invalid_references() {
        assert!(matches!(
            "".parse::<ModelRef>(),
            Err(ConfigError::EmptyModelName)
        ));
        assert!(matches!(
            "groq/".parse::<ModelRef>(),
            Err(ConfigError::InvalidModel(_))
        ));
        assert!(matches!(
            "/llama".parse::<ModelRef>(),
            Err(ConfigError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_serde_as_string() {
        let model = ModelRef::new("groq", "mixtral-8x7b-32768");
        let json = serde_json::to_string(&model).unwrap();
        assert_eq!(json, "\"groq/mixtral-8x7b-32768\"");
        let back: ModelRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, model);
    }
}
