//! Application-level configuration.
//!
//! - [`ExecutionParams`]: retry, chunking, context bounds and the
//!   layer-failure policy

pub mod execution_params;

pub use execution_params::{ContextLimits, ExecutionParams};
