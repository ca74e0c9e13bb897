//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for chat results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    /// Every layer's numbered outputs, then the final answer
    Full,
    /// Only the final answer
    Final,
    /// One JSON object per event line
    Json,
}

impl From<OutputFormatArg> for moa_domain::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Full => Self::Full,
            OutputFormatArg::Final => Self::Final,
            OutputFormatArg::Json => Self::Json,
        }
    }
}

/// CLI arguments for layered-moa
#[derive(Parser, Debug)]
#[command(name = "moa")]
#[command(author, version, about = "Mixture-of-Agents - layered LLM agents refine an answer")]
#[command(long_about = r#"
moa sends your question through several cycles of layer agents. Every cycle
runs all layer agents concurrently, numbers their answers and hands them to
the next cycle as reference material. A main agent then writes the final
answer from the last cycle's merged responses.

Configuration files are loaded from (in priority order):
1. MOA_* environment variables (MOA_MODELS__CYCLES=2)
2. --config <path>                Explicit config file
3. ./moa.toml or ./.moa.toml      Project-level config
4. ~/.config/moa/config.toml      Global config

Model names are written backend/model (groq/llama3-70b-8192); bare names go
to [providers] default. The offline 'echo' backend needs no API key.

Example:
  moa "What's the best way to handle errors in Rust?"
  moa --cycles 1 -m echo/main --output full "Try it offline"
  moa --chat
"#)]
pub struct Cli {
    /// The question to ask (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Main (final-stage) model, overriding [models] main
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Number of layer cycles, overriding [models] cycles
    #[arg(long, value_name = "N")]
    pub cycles: Option<usize>,

    /// Main agent temperature, overriding [models] temperature
    #[arg(short, long, value_name = "T")]
    pub temperature: Option<f32>,

    /// Output format (default: [output] format, else final)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormatArg>,

    /// Print the final answer only when it is complete
    #[arg(long)]
    pub no_stream: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Directory for daily-rolling diagnostic logs
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append a JSONL transcript of every chat to this file
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,
}

impl Cli {
    /// `tracing` filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
