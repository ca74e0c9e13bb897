//! Application layer for layered-moa
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ContextLimits, ExecutionParams};
pub use ports::{
    model_backend::{BackendError, BackendGateway, ModelBackend, StreamHandle},
    observer::{ChatObserver, NoObserver},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use use_cases::agent::{Agent, AgentError, InvokeOptions};
pub use use_cases::layer::{Layer, LayerError};
pub use use_cases::orchestrator::{
    ChatRequest, ChatStream, Orchestrator, OrchestratorBuilder, SharedMemory,
};
pub use use_cases::retry::{RetryPolicy, retry, retry_observed, retry_when};
