//! Core domain concepts shared across all subdomains.
//!
//! - [`model::ModelRef`]: `backend/model` reference used to route an agent
//! - [`text`]: character-bounded text helpers

pub mod model;
pub mod text;
