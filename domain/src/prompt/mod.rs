//! Prompt templates and the named template library.

pub mod library;
pub mod template;

pub use library::{DEFAULT_REFERENCE_ID, DEFAULT_SYSTEM_ID, PromptLibrary};
pub use template::PromptTemplate;
