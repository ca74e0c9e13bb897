//! Presentation layer for layered-moa
//!
//! This crate contains CLI definitions, console output formatting,
//! progress reporting, and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatOutcome, ChatRepl, ChatRunner};
pub use cli::commands::{Cli, OutputFormatArg};
pub use output::console::ConsoleFormatter;
pub use progress::reporter::ProgressReporter;
