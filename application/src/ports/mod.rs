//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod model_backend;
pub mod observer;
pub mod transcript_logger;
