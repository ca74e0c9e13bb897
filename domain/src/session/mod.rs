//! Backend conversation primitives.
//!
//! - [`entities::Message`]: a single chat message sent to a backend
//! - [`stream::StreamEvent`]: one event of a streamed backend response

pub mod entities;
pub mod stream;

pub use entities::{Message, Role};
pub use stream::StreamEvent;
