//! Chat execution: one-shot runs and the interactive REPL

pub mod repl;
pub mod runner;

pub use repl::{ChatRepl, ReplCommand, default_history_file};
pub use runner::{ChatOutcome, ChatRunner, Rendered};
