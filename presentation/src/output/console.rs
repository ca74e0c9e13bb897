//! Console output formatter for chat events

use colored::Colorize;
use moa_application::ExecutionParams;
use moa_domain::{ConfigIssue, MoaConfig, ResponseEvent, Severity};

/// Formats chat events and configuration for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One layer's numbered outputs (`--output full`)
    pub fn format_intermediate(layer_index: usize, text: &str, outputs: &[String]) -> String {
        let mut output = Self::section_header(&format!("Layer {}", layer_index));
        if outputs.is_empty() {
            output.push_str(text);
        } else {
            let numbered: Vec<String> = outputs
                .iter()
                .enumerate()
                .map(|(i, out)| format!("{} {}", format!("{}.", i + 1).yellow().bold(), out))
                .collect();
            output.push_str(&numbered.join("\n"));
        }
        output.push('\n');
        output
    }

    pub fn final_header() -> String {
        Self::section_header("Final Answer")
    }

    /// A failed cycle or a failed final stage.
    pub fn format_error(text: &str, layer_index: Option<usize>) -> String {
        match layer_index {
            Some(index) => format!(
                "{} {}",
                format!("Layer {} failed:", index).red().bold(),
                text
            ),
            None => format!("{} {}", "Error:".red().bold(), text),
        }
    }

    /// One event as a single JSON line
    pub fn format_json(event: &ResponseEvent) -> String {
        serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn format_issue(issue: &ConfigIssue) -> String {
        match issue.severity {
            Severity::Error => format!("{} {}", "error:".red().bold(), issue.message),
            Severity::Warning => format!("{} {}", "warning:".yellow().bold(), issue.message),
        }
    }

    /// Summary of the active agents and loop settings (`/config`)
    pub fn format_config(config: &MoaConfig, params: &ExecutionParams) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{} {} (temperature {}, prompt '{}')\n",
            "Main:".cyan().bold(),
            config.main_model,
            config.temperature,
            config.system_prompt
        ));
        output.push_str(&format!(
            "{} {}  {} {}\n",
            "Cycles:".cyan().bold(),
            config.cycles,
            "Reference prompt:".cyan().bold(),
            config.reference_prompt
        ));
        output.push_str(&format!("{}\n", "Layer agents:".cyan().bold()));
        for agent in &config.layer_agents {
            output.push_str(&format!(
                "  - {:<16} {} (temperature {}, prompt '{}')\n",
                agent.name, agent.model, agent.temperature, agent.system_prompt
            ));
        }
        output.push_str(&format!(
            "{} {} attempts, {:?} apart; chunks of {} tokens ({} overlap); on layer failure: {}\n",
            "Execution:".cyan().bold(),
            params.retry.attempts(),
            params.retry.delay,
            params.chunking.max_tokens,
            params.chunking.overlap,
            params.on_layer_failure
        ));
        output
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", format!("── {} ──", title).cyan().bold(), "-".repeat(40))
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intermediate_numbers_outputs() {
        let out = ConsoleFormatter::format_intermediate(
            2,
            "ignored",
            &["x".to_string(), "y".to_string()],
        );
        assert!(out.contains("Layer 2"));
        assert!(out.contains(" x\n"));
        assert!(out.ends_with(" y\n"));
        assert!(!out.contains("ignored"));
    }

    #[test]
    fn test_intermediate_without_outputs_shows_text() {
        let out = ConsoleFormatter::format_intermediate(1, "merged text", &[]);
        assert!(out.contains("merged text"));
    }

    #[test]
    fn test_json_is_one_line() {
        let event = ResponseEvent::Error {
            text: "down".to_string(),
            layer_index: Some(1),
        };
        let line = ConsoleFormatter::format_json(&event);
        assert!(!line.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["layer_index"], 1);
    }

    #[test]
    fn test_config_lists_agents() {
        let out = ConsoleFormatter::format_config(&MoaConfig::default(), &ExecutionParams::default());
        assert!(out.contains("layer_agent_1"));
        assert!(out.contains("gemma2-9b-it"));
        assert!(out.contains("degrade"));
    }

    #[test]
    fn test_indent() {
        assert_eq!(ConsoleFormatter::indent("a\nb", "  "), "  a\n  b");
    }
}
