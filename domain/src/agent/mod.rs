//! Agent domain
//!
//! - [`entities::AgentSpec`]: one model-backed generator bound to a template
//! - [`entities::LayerSpec`]: the agents run concurrently in one cycle
//! - [`value_objects`]: generation parameters and credentials

pub mod entities;
pub mod value_objects;

pub use entities::{AgentSpec, LayerSpec};
pub use value_objects::{ApiKey, GenerationParams};
