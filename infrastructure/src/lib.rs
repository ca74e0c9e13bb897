//! Infrastructure layer for layered-moa
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file loading, the backend
//! registry with its model backends, and the JSONL transcript logger.

pub mod config;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigSource, FileConfig, FileConfigError, FileLayerAgentConfig,
    FileOutputConfig, FileReplConfig, ResolvedConfig,
};
pub use logging::JsonlTranscriptLogger;
pub use providers::{BackendRegistry, EchoBackend};
#[cfg(feature = "http-backend")]
pub use providers::OpenAiCompatBackend;
