//! Configuration value objects for the domain layer
//!
//! These are domain concepts related to configuration that are
//! used across multiple layers.

mod error;
mod moa_config;
mod output_format;
pub mod validation;

pub use error::ConfigError;
pub use moa_config::{LayerAgentConfig, MAIN_AGENT_NAME, MoaConfig};
pub use output_format::OutputFormat;
pub use validation::{ConfigIssue, ConfigIssueCode, Severity};
