//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod agent;
pub mod layer;
pub mod orchestrator;
pub mod retry;
