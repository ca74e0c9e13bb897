use super::echo::EchoBackend;
use crate::config::FileProvidersConfig;
use moa_application::ports::model_backend::{BackendGateway, ModelBackend};
use moa_domain::config::validation::ConfigIssue;
use moa_domain::{ConfigError, ModelRef};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Named backends plus the rules for bare model names.
///
/// Resolution order for a [`ModelRef`]:
///  1. an explicit `backend/` prefix selects that backend
///  2. a bare name listed in the routing table uses the routed backend
///  3. otherwise the default backend
///
/// A backend name that is not registered is a [`ConfigError`], reported
/// when the orchestrator is built rather than on the first request.
pub struct BackendRegistry {
    backends: HashMap<String, Arc<dyn ModelBackend>>,
    routing: HashMap<String, String>,
    default_backend: Option<String>,
}

impl BackendRegistry {
    /// Empty registry apart from the `echo` backend.
    pub fn new() -> Self {
        let mut registry = Self {
            backends: HashMap::new(),
            routing: HashMap::new(),
            default_backend: None,
        };
        registry.register(Arc::new(EchoBackend::new()));
        registry
    }

    /// Build from the `[providers]` section.
    ///
    /// HTTP backends that cannot be constructed are skipped and reported.
    pub fn from_config(config: &FileProvidersConfig) -> (Self, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let mut registry = Self::new().with_default(config.default.clone());

        for (model, backend) in &config.routing {
            registry.route(model.clone(), backend.clone());
        }

        #[cfg(feature = "http-backend")]
        for (name, http) in &config.http {
            match super::openai_compat::OpenAiCompatBackend::from_config(name.clone(), http) {
                Ok(backend) => registry.register(Arc::new(backend)),
                Err(e) => issues.push(ConfigIssue::error(
                    moa_domain::ConfigIssueCode::Other,
                    format!("providers.http.{}: {}", name, e),
                )),
            }
        }

        #[cfg(not(feature = "http-backend"))]
        if !config.http.is_empty() {
            issues.push(ConfigIssue::warning(
                moa_domain::ConfigIssueCode::Other,
                "providers.http: HTTP backends are not compiled into this build; \
                 only 'echo' is available",
            ));
        }

        (registry, issues)
    }

    /// Add or replace a backend under its own name.
    pub fn register(&mut self, backend: Arc<dyn ModelBackend>) {
        debug!(backend = %backend.name(), "Registering model backend");
        self.backends.insert(backend.name().to_string(), backend);
    }

    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.register(backend);
        self
    }

    pub fn with_default(mut self, backend: impl Into<String>) -> Self {
        self.default_backend = Some(backend.into());
        self
    }

    /// Send the bare model name `model` to `backend`.
    pub fn route(&mut self, model: impl Into<String>, backend: impl Into<String>) {
        self.routing.insert(model.into(), backend.into());
    }

    pub fn default_backend(&self) -> Option<&str> {
        self.default_backend.as_deref()
    }

    /// Registered backend names, sorted.
    pub fn backend_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.backends.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Name of the backend `model` would be sent to.
    pub fn backend_for<'a>(&'a self, model: &'a ModelRef) -> Option<&'a str> {
        model
            .backend()
            .or_else(|| self.routing.get(model.name()).map(String::as_str))
            .or(self.default_backend.as_deref())
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendGateway for BackendRegistry {
    fn resolve(&self, model: &ModelRef) -> Result<Arc<dyn ModelBackend>, ConfigError> {
        let name = self
            .backend_for(model)
            .ok_or_else(|| ConfigError::NoBackend(model.to_string()))?;

        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownBackend {
                backend: name.to_string(),
                model: model.to_string(),
            })
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.backend_names())
            .field("routing", &self.routing)
            .field("default_backend", &self.default_backend)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ECHO_BACKEND;
    use async_trait::async_trait;
    use moa_application::ports::model_backend::BackendError;
    use moa_domain::{GenerationParams, Message};

    struct Named(&'static str);

    #[async_trait]
    impl ModelBackend for Named {
        fn name(&self) -> &str {
            self.0
        }

        async fn generate(
            &self,
            _model: &str,
            _messages: &[Message],
            _params: &GenerationParams,
        ) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    fn registry() -> BackendRegistry {
        let mut registry = BackendRegistry::new()
            .with_backend(Arc::new(Named("groq")))
            .with_backend(Arc::new(Named("openai")))
            .with_default("groq");
        registry.route("gpt-4o-mini", "openai");
        registry
    }

    fn resolved(registry: &BackendRegistry, model: &str) -> String {
        let model: ModelRef = model.parse().unwrap();
        registry.resolve(&model).unwrap().name().to_string()
    }

    #[test]
    fn test_explicit_prefix_wins() {
        let registry = registry();
        assert_eq!(resolved(&registry, "openai/llama3"), "openai");
        assert_eq!(resolved(&registry, "echo/gpt-4o-mini"), "echo");
    }

    #[test]
    fn test_routing_table_for_bare_names() {
        assert_eq!(resolved(&registry(), "gpt-4o-mini"), "openai");
    }

    #[test]
    fn test_default_for_bare_names() {
        assert_eq!(resolved(&registry(), "llama3-70b-8192"), "groq");
    }

    #[test]
    fn test_unknown_backend_is_config_error() {
        let model: ModelRef = "nowhere/m".parse().unwrap();
        let err = registry().resolve(&model).err().unwrap();
        assert_eq!(
            err,
            ConfigError::UnknownBackend {
                backend: "nowhere".to_string(),
                model: "nowhere/m".to_string(),
            }
        );
    }

    #[test]
    fn test_no_default_is_config_error() {
        let registry = BackendRegistry::new();
        let err = registry.resolve(&ModelRef::bare("m")).err().unwrap();
        assert_eq!(err, ConfigError::NoBackend("m".to_string()));
    }

    #[test]
    fn test_echo_is_always_registered() {
        let registry = BackendRegistry::new();
        assert_eq!(registry.backend_names(), vec![ECHO_BACKEND]);
    }

    #[test]
    fn test_from_config_default_registers_presets() {
        let (registry, issues) = BackendRegistry::from_config(&FileProvidersConfig::default());
        assert_eq!(registry.default_backend(), Some("groq"));
        if cfg!(feature = "http-backend") {
            assert!(issues.is_empty());
            assert_eq!(registry.backend_names(), vec!["echo", "groq", "openai"]);
        } else {
            assert_eq!(issues.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_resolved_backend_generates() {
        let model: ModelRef = "echo/m".parse().unwrap();
        let backend = registry().resolve(&model).unwrap();
        let text = backend
            .generate("m", &[Message::user("ping")], &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "[m] ping");
    }
}
