//! Configuration errors

use crate::chunking::ChunkingError;
use thiserror::Error;

/// A configuration that cannot be turned into a working orchestrator.
///
/// Raised while building, never while a chat is running.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("model name is empty")]
    EmptyModelName,

    #[error("invalid model reference '{0}' (expected 'backend/model' or 'model')")]
    InvalidModel(String),

    #[error("unknown prompt template '{0}'")]
    UnknownTemplate(String),

    #[error("cycles must be at least 1")]
    InvalidCycles,

    #[error("temperature {value} for {target} is outside [0, 1]")]
    TemperatureOutOfRange { target: String, value: f32 },

    #[error("reference template '{0}' has no {{helper_response}} slot")]
    MissingMergeSlot(String),

    #[error("unknown backend '{backend}' for model '{model}'")]
    UnknownBackend { backend: String, model: String },

    #[error("model '{0}' names no backend and no default backend is configured")]
    NoBackend(String),

    #[error("duplicate agent name '{0}' in layer")]
    DuplicateAgent(String),

    #[error("layer has no agents")]
    EmptyLayer,

    #[error(transparent)]
    Chunking(#[from] ChunkingError),

    #[error("{0}")]
    Invalid(String),
}
