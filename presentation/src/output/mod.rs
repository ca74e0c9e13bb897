//! Console rendering of chat events

pub mod console;
