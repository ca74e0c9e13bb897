//! CLI entrypoint for layered-moa
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use clap::Parser;
use moa_application::{
    ChatObserver, ChatRequest, NoTranscriptLogger, Orchestrator, TranscriptLogger,
};
use moa_domain::{ConfigIssue, OutputFormat};
use moa_infrastructure::{
    BackendRegistry, ConfigLoader, FileConfig, FileConfigError, JsonlTranscriptLogger,
};
use moa_presentation::chat::default_history_file;
use moa_presentation::{ChatRepl, ChatRunner, Cli, ConsoleFormatter, ProgressReporter};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.show_config {
        println!("Configuration sources (highest priority first):");
        for source in ConfigLoader::sources(cli.config.as_deref()) {
            println!("  {}", source);
        }
        return Ok(ExitCode::SUCCESS);
    }

    // === Configuration ===
    let (mut file_config, mut issues) = if cli.no_config {
        (ConfigLoader::load_defaults(), Vec::new())
    } else {
        ConfigLoader::load_checked(cli.config.as_deref())?
    };
    apply_overrides(&mut file_config, &cli);

    if cli.dump_config {
        print!("{}", file_config.to_toml()?);
        return Ok(ExitCode::SUCCESS);
    }

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| file_config.logging.log_dir.as_deref().map(expand_home));
    let _guard = init_logging(cli.log_level(), log_dir.as_deref());

    info!("Starting layered-moa");

    let resolved = match file_config.resolve() {
        Ok(resolved) => resolved,
        Err(FileConfigError::Invalid { issues: errors }) => {
            issues.extend(errors);
            print_issues(&issues);
            bail!("Invalid configuration");
        }
        Err(e) => return Err(e.into()),
    };
    issues.extend(resolved.warnings.iter().cloned());

    // === Dependency Injection ===
    let (registry, backend_issues) = BackendRegistry::from_config(&file_config.providers);
    issues.extend(backend_issues);
    print_issues(&issues);
    if issues.iter().any(ConfigIssue::is_error) {
        bail!("Invalid backend configuration");
    }
    let gateway = Arc::new(registry);

    if !file_config.output.color {
        colored::control::set_override(false);
    }

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .unwrap_or(file_config.output.format);

    let mut reporter = ProgressReporter::new();
    if cli.quiet || (cli.chat && !file_config.repl.show_progress) {
        reporter = reporter.without_bars();
    }
    if cli.no_stream || !file_config.output.stream || format == OutputFormat::Json {
        reporter = reporter.without_streaming();
    }
    if format == OutputFormat::Full {
        reporter = reporter.with_final_header();
    }
    let runner = ChatRunner::new(format, reporter.streams_output());
    let observer: Arc<dyn ChatObserver> = Arc::new(reporter);
    let logger = transcript_logger(&cli, &file_config);

    // Chat mode
    if cli.chat {
        let history_file = match &file_config.repl.history_file {
            Some(path) => Some(expand_home(path)),
            None => default_history_file(),
        };
        let repl = ChatRepl::new(
            resolved.moa,
            resolved.execution,
            gateway,
            observer,
            logger,
            runner,
        )?
        .with_history_file(history_file, file_config.repl.history_size);

        repl.run().await?;
        return Ok(ExitCode::SUCCESS);
    }

    // Single question mode - question is required
    let question = match cli.question {
        Some(q) => q,
        None => bail!("Question is required. Use --chat for interactive mode."),
    };

    let orchestrator = Orchestrator::builder(resolved.moa, gateway)
        .with_params(resolved.execution)
        .with_observer(observer)
        .with_logger(logger)
        .build()?;

    let outcome = runner.run(&orchestrator, ChatRequest::new(question)).await;
    if outcome.succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Command-line flags win over every configuration source.
fn apply_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.models.main = model.clone();
    }
    if let Some(cycles) = cli.cycles {
        config.models.cycles = cycles;
    }
    if let Some(temperature) = cli.temperature {
        config.models.temperature = temperature;
    }
}

fn print_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        eprintln!("{}", ConsoleFormatter::format_issue(issue));
    }
}

/// Console logging on stderr, plus a daily-rolling file under `log_dir`.
///
/// `RUST_LOG` overrides the `-v` level.
fn init_logging(level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "moa.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    guard
}

fn transcript_logger(cli: &Cli, config: &FileConfig) -> Arc<dyn TranscriptLogger> {
    let path = cli
        .transcript
        .clone()
        .or_else(|| config.logging.transcript_path.as_deref().map(expand_home));

    match path {
        Some(path) => match JsonlTranscriptLogger::open(&path) {
            Some(logger) => Arc::new(logger),
            None => {
                warn!("Transcript disabled: cannot open {}", path.display());
                Arc::new(NoTranscriptLogger)
            }
        },
        None => Arc::new(NoTranscriptLogger),
    }
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
