//! REPL (Read-Eval-Print Loop) for interactive chat

use super::runner::ChatRunner;
use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use moa_application::{
    BackendGateway, ChatObserver, ChatRequest, ExecutionParams, Orchestrator, SharedMemory,
    TranscriptLogger,
};
use moa_domain::{ConfigError, MoaConfig};
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// A slash command typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Config,
    Memory,
    Clear,
    Cycles(usize),
    Quit,
}

impl ReplCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut parts = line.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        match name {
            "/help" | "/h" | "/?" => Ok(Self::Help),
            "/config" => Ok(Self::Config),
            "/memory" | "/history" => Ok(Self::Memory),
            "/clear" => Ok(Self::Clear),
            "/quit" | "/exit" | "/q" => Ok(Self::Quit),
            "/cycles" => match arg.map(str::parse::<usize>) {
                Some(Ok(n)) if n >= 1 => Ok(Self::Cycles(n)),
                Some(_) => Err("/cycles takes a number of at least 1".to_string()),
                None => Err("usage: /cycles N".to_string()),
            },
            other => Err(format!(
                "Unknown command: {}\nType /help for available commands",
                other
            )),
        }
    }
}

/// Interactive chat REPL
///
/// Every line is one chat on the same orchestrator, so earlier answers
/// reach later prompts through the conversation memory.
pub struct ChatRepl {
    orchestrator: Orchestrator,
    config: MoaConfig,
    params: ExecutionParams,
    gateway: Arc<dyn BackendGateway>,
    observer: Arc<dyn ChatObserver>,
    logger: Arc<dyn TranscriptLogger>,
    runner: ChatRunner,
    history_file: Option<PathBuf>,
    history_size: usize,
}

impl ChatRepl {
    pub fn new(
        config: MoaConfig,
        params: ExecutionParams,
        gateway: Arc<dyn BackendGateway>,
        observer: Arc<dyn ChatObserver>,
        logger: Arc<dyn TranscriptLogger>,
        runner: ChatRunner,
    ) -> Result<Self, ConfigError> {
        let orchestrator = Self::build(&config, &params, &gateway, &observer, &logger, None)?;
        Ok(Self {
            orchestrator,
            config,
            params,
            gateway,
            observer,
            logger,
            runner,
            history_file: default_history_file(),
            history_size: 1000,
        })
    }

    /// Set the history file; `None` keeps history in memory only.
    pub fn with_history_file(mut self, path: Option<PathBuf>, size: usize) -> Self {
        self.history_file = path;
        self.history_size = size;
        self
    }

    fn build(
        config: &MoaConfig,
        params: &ExecutionParams,
        gateway: &Arc<dyn BackendGateway>,
        observer: &Arc<dyn ChatObserver>,
        logger: &Arc<dyn TranscriptLogger>,
        memory: Option<SharedMemory>,
    ) -> Result<Orchestrator, ConfigError> {
        let mut builder = Orchestrator::builder(config.clone(), Arc::clone(gateway))
            .with_params(params.clone())
            .with_observer(Arc::clone(observer))
            .with_logger(Arc::clone(logger));
        if let Some(memory) = memory {
            builder = builder.with_memory(memory);
        }
        builder.build()
    }

    fn editor(&self) -> Reedline {
        let editor = Reedline::create();
        let Some(path) = &self.history_file else {
            return editor;
        };

        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match FileBackedHistory::with_file(self.history_size, path.clone()) {
            Ok(history) => editor.with_history(Box::new(history)),
            Err(e) => {
                warn!("Could not open history file {}: {}", path.display(), e);
                editor
            }
        }
    }

    /// Run the interactive REPL
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut editor = self.editor();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("moa".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.print_welcome();

        loop {
            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }

                    if line.starts_with('/') {
                        if self.handle_command(line).await {
                            break;
                        }
                        continue;
                    }

                    self.process_input(line).await;
                }
                Signal::CtrlC => {
                    println!("^C");
                    continue;
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("╭─────────────────────────────────────────────╮");
        println!("│           Mixture-of-Agents - Chat          │");
        println!("╰─────────────────────────────────────────────╯");
        println!();
        println!(
            "Main: {}  Cycles: {}  Layer: {}",
            self.config.main_model,
            self.orchestrator.cycles(),
            self.orchestrator.layer_names(1).join(", ")
        );
        println!();
        Self::print_help();
    }

    fn print_help() {
        println!("Commands:");
        println!("  /help, /h, /?     - Show this help");
        println!("  /config           - Show agents and loop settings");
        println!("  /memory           - Show the conversation so far");
        println!("  /clear            - Forget the conversation");
        println!("  /cycles N         - Run N layer cycles from now on");
        println!("  /quit, /exit, /q  - Exit chat");
        println!();
    }

    /// Handle slash commands. Returns true if should exit.
    async fn handle_command(&mut self, line: &str) -> bool {
        let command = match ReplCommand::parse(line) {
            Ok(command) => command,
            Err(message) => {
                println!("{}", message);
                return false;
            }
        };

        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return true;
            }
            ReplCommand::Help => {
                println!();
                Self::print_help();
            }
            ReplCommand::Config => {
                println!();
                println!(
                    "{}",
                    ConsoleFormatter::format_config(&self.config, &self.params)
                );
            }
            ReplCommand::Memory => {
                let memory = self.orchestrator.memory();
                let memory = memory.read().await;
                if memory.is_empty() {
                    println!("{}", "(no conversation yet)".dimmed());
                } else {
                    println!("{}", memory.render());
                }
            }
            ReplCommand::Clear => {
                self.orchestrator.clear_memory().await;
                println!("Conversation cleared.");
            }
            ReplCommand::Cycles(cycles) => self.set_cycles(cycles),
        }
        false
    }

    /// Rebuild the orchestrator with `cycles`, keeping the conversation.
    fn set_cycles(&mut self, cycles: usize) {
        let config = self.config.clone().with_cycles(cycles);
        match Self::build(
            &config,
            &self.params,
            &self.gateway,
            &self.observer,
            &self.logger,
            Some(self.orchestrator.memory()),
        ) {
            Ok(orchestrator) => {
                self.orchestrator = orchestrator;
                self.config = config;
                println!("Cycles set to {}.", cycles);
            }
            Err(e) => eprintln!("{}", ConsoleFormatter::format_error(&e.to_string(), None)),
        }
    }

    async fn process_input(&self, input: &str) {
        println!();
        let outcome = self
            .runner
            .run(&self.orchestrator, ChatRequest::new(input))
            .await;
        if outcome.interrupted {
            warn!("Chat interrupted; nothing was saved to memory");
        }
        println!();
    }
}

/// `<data dir>/moa/history.txt`
pub fn default_history_file() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("moa").join("history.txt"))
}
