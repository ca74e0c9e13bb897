//! Progress reporting for chat execution

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use moa_application::ports::observer::ChatObserver;
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Reports chat progress with one bar per cycle and streams the final
/// answer to stdout as it arrives.
pub struct ProgressReporter {
    multi: MultiProgress,
    cycle_bar: Mutex<Option<ProgressBar>>,
    final_spinner: Mutex<Option<ProgressBar>>,
    show_bars: bool,
    stream_output: bool,
    final_header: bool,
    header_pending: Mutex<bool>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            cycle_bar: Mutex::new(None),
            final_spinner: Mutex::new(None),
            show_bars: true,
            stream_output: true,
            final_header: false,
            header_pending: Mutex::new(false),
        }
    }

    /// Hide the progress bars (`--quiet`).
    pub fn without_bars(mut self) -> Self {
        self.show_bars = false;
        self
    }

    /// Leave printing of the final answer to the caller.
    pub fn without_streaming(mut self) -> Self {
        self.stream_output = false;
        self
    }

    /// Print a "Final Answer" header before the first streamed delta.
    pub fn with_final_header(mut self) -> Self {
        self.final_header = true;
        self
    }

    pub fn streams_output(&self) -> bool {
        self.stream_output
    }

    fn cycle_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.final_spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_and_clear();
        }
    }

    fn note(&self, line: String) {
        if self.show_bars {
            let _ = self.multi.println(line);
        } else {
            eprintln!("{}", line);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatObserver for ProgressReporter {
    fn on_cycle_start(&self, cycle: usize, total_cycles: usize, agents: &[String]) {
        if !self.show_bars {
            return;
        }
        let pb = self.multi.add(ProgressBar::new(agents.len() as u64));
        pb.set_style(Self::cycle_style());
        pb.set_prefix(format!("Layer {}/{}", cycle, total_cycles));
        pb.set_message("Starting...");
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut bar) = self.cycle_bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_agent_complete(&self, _cycle: usize, agent: &str, success: bool) {
        if let Ok(bar) = self.cycle_bar.lock()
            && let Some(pb) = bar.as_ref()
        {
            let status = if success {
                format!("{} {}", "v".green(), agent)
            } else {
                format!("{} {}", "x".red(), agent)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_cycle_complete(&self, _cycle: usize, merged: bool) {
        if let Ok(mut bar) = self.cycle_bar.lock()
            && let Some(pb) = bar.take()
        {
            if merged {
                pb.finish_with_message(format!("{}", "merged".green()));
            } else {
                pb.finish_with_message(format!("{}", "all agents failed".red()));
            }
        }
    }

    fn on_retry(&self, agent: &str, attempt: u32, error: &str) {
        self.note(format!(
            "  {} {} attempt {}: {}",
            "retry".yellow(),
            agent,
            attempt,
            error
        ));
    }

    fn on_final_start(&self, agent: &str) {
        if let Ok(mut pending) = self.header_pending.lock() {
            *pending = self.final_header;
        }
        if !self.show_bars {
            return;
        }
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(Self::spinner_style());
        pb.set_prefix("Final");
        pb.set_message(format!("{} is writing the answer...", agent));
        pb.enable_steady_tick(Duration::from_millis(100));

        if let Ok(mut spinner) = self.final_spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_output_delta(&self, chunk: &str) {
        if !self.stream_output {
            return;
        }
        self.clear_spinner();
        let mut stdout = std::io::stdout().lock();
        if let Ok(mut pending) = self.header_pending.lock()
            && std::mem::take(&mut *pending)
        {
            let _ = writeln!(stdout, "{}", ConsoleFormatter::final_header());
        }
        let _ = stdout.write_all(chunk.as_bytes());
        let _ = stdout.flush();
    }

    fn on_output_reset(&self, _discarded: &str) {
        if !self.stream_output {
            return;
        }
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout);
        let _ = writeln!(stdout, "{}", "(stream interrupted, restarting)".dimmed());
        let _ = stdout.flush();
    }

    fn on_final_complete(&self, _success: bool) {
        self.clear_spinner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_bar_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_cycle_start(1, 2, &["a".to_string(), "b".to_string()]);
        reporter.on_agent_complete(1, "a", true);
        reporter.on_agent_complete(1, "b", false);
        {
            let bar = reporter.cycle_bar.lock().unwrap();
            assert_eq!(bar.as_ref().unwrap().position(), 2);
        }
        reporter.on_cycle_complete(1, true);
        assert!(reporter.cycle_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_no_bars_when_quiet() {
        let reporter = ProgressReporter::new().without_bars();
        reporter.on_cycle_start(1, 1, &["a".to_string()]);
        reporter.on_final_start("main");
        assert!(reporter.cycle_bar.lock().unwrap().is_none());
        assert!(reporter.final_spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_final_spinner_cleared_on_complete() {
        let reporter = ProgressReporter::new().without_streaming();
        reporter.on_final_start("main");
        assert!(reporter.final_spinner.lock().unwrap().is_some());
        reporter.on_final_complete(true);
        assert!(reporter.final_spinner.lock().unwrap().is_none());
        assert!(!reporter.streams_output());
    }

    #[test]
    fn test_header_printed_once() {
        let reporter = ProgressReporter::new().without_bars().with_final_header();
        reporter.on_final_start("main");
        assert!(*reporter.header_pending.lock().unwrap());
        reporter.on_output_delta("a");
        assert!(!*reporter.header_pending.lock().unwrap());
        reporter.on_output_reset("a");
        reporter.on_output_delta("b");
        assert!(!*reporter.header_pending.lock().unwrap());
    }
}
