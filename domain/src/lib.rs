//! Domain layer for layered-moa
//!
//! This crate contains the core types of the mixture-of-agents pipeline.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Layers and cycles
//!
//! A **layer** is an ordered set of agents run side by side on the same
//! [`Context`]. Their surviving outputs are numbered and merged through the
//! reference template into a [`MergeResult`], whose text becomes the
//! `helper_response` slot of the next **cycle**. After the last cycle a
//! single synthesis agent produces the answer.
//!
//! ## Events
//!
//! A chat is observed as a finite sequence of [`ResponseEvent`]s: one per
//! cycle (`Intermediate` or `Error`), then `Output` or a final `Error`.

pub mod agent;
pub mod chunking;
pub mod config;
pub mod context;
pub mod core;
pub mod memory;
pub mod orchestration;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use agent::{AgentSpec, ApiKey, GenerationParams, LayerSpec};
pub use chunking::{ChunkConfig, Chunker, ChunkingError, Tokenizer, WhitespaceTokenizer};
pub use config::{
    ConfigError, ConfigIssue, ConfigIssueCode, LayerAgentConfig, MAIN_AGENT_NAME, MoaConfig,
    OutputFormat, Severity,
};
pub use context::{Context, slots};
pub use core::model::ModelRef;
pub use memory::{ConversationMemory, Turn};
pub use orchestration::{LayerFailurePolicy, MergeResult, ResponseEvent};
pub use prompt::{PromptLibrary, PromptTemplate};
pub use session::{Message, Role, StreamEvent};
