//! Model backends and the registry that routes model references to them.

pub mod echo;
#[cfg(feature = "http-backend")]
pub mod openai_compat;
pub mod registry;

pub use crate::config::ECHO_BACKEND;
pub use echo::EchoBackend;
#[cfg(feature = "http-backend")]
pub use openai_compat::OpenAiCompatBackend;
pub use registry::BackendRegistry;
