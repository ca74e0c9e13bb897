//! Runs one chat and prints its events.

use crate::output::console::ConsoleFormatter;
use moa_application::{ChatRequest, Orchestrator};
use moa_domain::{OutputFormat, ResponseEvent};

/// What a finished chat produced
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The final answer, if the chat got that far
    pub output: Option<String>,
    /// Cycles that ended with every agent failed
    pub failed_layers: Vec<usize>,
    /// Error text of a failed final stage
    pub final_error: Option<String>,
    /// Stopped with Ctrl-C
    pub interrupted: bool,
}

impl ChatOutcome {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }

    fn record(&mut self, event: &ResponseEvent) {
        match event {
            ResponseEvent::Intermediate { .. } => {}
            ResponseEvent::Output { text } => self.output = Some(text.clone()),
            ResponseEvent::Error {
                layer_index: Some(index),
                ..
            } => self.failed_layers.push(*index),
            ResponseEvent::Error {
                text,
                layer_index: None,
            } => self.final_error = Some(text.clone()),
        }
    }
}

/// Where a rendered event goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Stdout(String),
    Stderr(String),
}

/// Prints chat events in the chosen [`OutputFormat`].
#[derive(Debug, Clone, Copy)]
pub struct ChatRunner {
    format: OutputFormat,
    /// The final answer was already printed delta by delta.
    streamed: bool,
}

impl ChatRunner {
    /// `streamed` must match whether the observer prints output deltas;
    /// it is ignored for JSON output. With `--output full` the observer
    /// also prints the final header before the first delta.
    pub fn new(format: OutputFormat, streamed: bool) -> Self {
        Self {
            format,
            streamed: streamed && format != OutputFormat::Json,
        }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Start `request` on `orchestrator` and print every event until the
    /// stream ends or Ctrl-C cancels it.
    pub async fn run(&self, orchestrator: &Orchestrator, request: ChatRequest) -> ChatOutcome {
        let mut stream = orchestrator.chat(request);
        let mut outcome = ChatOutcome::default();

        loop {
            let event = tokio::select! {
                event = stream.next_event() => event,
                _ = tokio::signal::ctrl_c() => {
                    stream.cancel();
                    outcome.interrupted = true;
                    eprintln!("\n^C (chat cancelled)");
                    break;
                }
            };
            let Some(event) = event else {
                break;
            };

            for rendered in self.render(&event) {
                match rendered {
                    Rendered::Stdout(text) => println!("{}", text),
                    Rendered::Stderr(text) => eprintln!("{}", text),
                }
            }
            outcome.record(&event);
        }

        outcome
    }

    /// How one event is shown.
    pub fn render(&self, event: &ResponseEvent) -> Vec<Rendered> {
        if self.format == OutputFormat::Json {
            return vec![Rendered::Stdout(ConsoleFormatter::format_json(event))];
        }

        match event {
            ResponseEvent::Intermediate {
                text,
                layer_index,
                outputs,
            } => match self.format {
                OutputFormat::Full => vec![Rendered::Stdout(
                    ConsoleFormatter::format_intermediate(*layer_index, text, outputs),
                )],
                _ => Vec::new(),
            },
            ResponseEvent::Output { text } => {
                let mut rendered = Vec::new();
                if self.format == OutputFormat::Full && !self.streamed {
                    rendered.push(Rendered::Stdout(ConsoleFormatter::final_header()));
                }
                if self.streamed {
                    // Deltas ended without a newline.
                    rendered.push(Rendered::Stdout(String::new()));
                } else {
                    rendered.push(Rendered::Stdout(text.clone()));
                }
                rendered
            }
            ResponseEvent::Error { text, layer_index } => vec![Rendered::Stderr(
                ConsoleFormatter::format_error(text, *layer_index),
            )],
        }
    }
}
