//! Layered orchestration domain
//!
//! Result and event types shared by the layer fan-out and the chat loop,
//! plus the policy applied when a whole layer fails.

pub mod policy;
pub mod value_objects;

pub use policy::LayerFailurePolicy;
pub use value_objects::{MergeResult, ResponseEvent};
