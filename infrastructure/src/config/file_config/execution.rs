//! Chat loop control from TOML (`[execution]` section)

use moa_application::{ContextLimits, ExecutionParams};
use moa_domain::config::validation::{ConfigIssue, ConfigIssueCode};
use moa_domain::{ChunkConfig, LayerFailurePolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry, chunking, context bounds and layer failure policy
///
/// # Example
///
/// ```toml
/// [execution]
/// max_attempts = 3
/// retry_delay_ms = 1000
/// chunk_max_tokens = 4000
/// chunk_overlap = 200
/// max_helper_chars = 24000
/// max_transcript_chars = 16000
/// on_layer_failure = "degrade"   # or "fail_fast"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileExecutionConfig {
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub chunk_max_tokens: usize,
    pub chunk_overlap: usize,
    pub max_helper_chars: usize,
    pub max_transcript_chars: usize,
    pub on_layer_failure: String,
}

impl Default for FileExecutionConfig {
    fn default() -> Self {
        let params = ExecutionParams::default();
        Self {
            max_attempts: params.retry.max_attempts,
            retry_delay_ms: params.retry.delay.as_millis() as u64,
            chunk_max_tokens: params.chunking.max_tokens,
            chunk_overlap: params.chunking.overlap,
            max_helper_chars: params.limits.max_helper_chars,
            max_transcript_chars: params.limits.max_transcript_chars,
            on_layer_failure: params.on_layer_failure.to_string(),
        }
    }
}

impl FileExecutionConfig {
    /// Parse `on_layer_failure`; unknown values fall back to `degrade`.
    pub fn parse_layer_failure(&self) -> (LayerFailurePolicy, Vec<ConfigIssue>) {
        match self.on_layer_failure.parse::<LayerFailurePolicy>() {
            Ok(policy) => (policy, Vec::new()),
            Err(e) => (
                LayerFailurePolicy::default(),
                vec![ConfigIssue::warning(
                    ConfigIssueCode::Other,
                    format!("execution.on_layer_failure: {}, using 'degrade'", e),
                )],
            ),
        }
    }

    pub fn to_execution_params(&self) -> (ExecutionParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let chunking = match ChunkConfig::new(self.chunk_max_tokens, self.chunk_overlap) {
            Ok(chunking) => chunking,
            Err(e) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidChunking,
                    format!("execution: {}", e),
                ));
                ChunkConfig::default()
            }
        };

        if self.max_attempts == 0 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::Other,
                "execution.max_attempts is 0; every call is attempted once",
            ));
        }

        let (policy, policy_issues) = self.parse_layer_failure();
        issues.extend(policy_issues);

        let params = ExecutionParams::default()
            .with_retry(
                self.max_attempts,
                Duration::from_millis(self.retry_delay_ms),
            )
            .with_chunking(chunking)
            .with_limits(ContextLimits {
                max_helper_chars: self.max_helper_chars,
                max_transcript_chars: self.max_transcript_chars,
            })
            .with_layer_failure(policy);

        (params, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_to_default_params() {
        let (params, issues) = FileExecutionConfig::default().to_execution_params();
        assert!(issues.is_empty());
        assert_eq!(params, ExecutionParams::default());
    }

    #[test]
    fn test_custom_values() {
        let file = FileExecutionConfig {
            max_attempts: 5,
            retry_delay_ms: 250,
            chunk_max_tokens: 100,
            chunk_overlap: 10,
            on_layer_failure: "fail-fast".to_string(),
            ..Default::default()
        };
        let (params, issues) = file.to_execution_params();
        assert!(issues.is_empty());
        assert_eq!(params.retry.max_attempts, 5);
        assert_eq!(params.retry.delay, Duration::from_millis(250));
        assert_eq!(params.chunking.max_tokens, 100);
        assert_eq!(params.on_layer_failure, LayerFailurePolicy::FailFast);
    }

    #[test]
    fn test_overlap_too_large_is_error() {
        let file = FileExecutionConfig {
            chunk_max_tokens: 10,
            chunk_overlap: 10,
            ..Default::default()
        };
        let (params, issues) = file.to_execution_params();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert_eq!(issues[0].code, ConfigIssueCode::InvalidChunking);
        assert_eq!(params.chunking, ChunkConfig::default());
    }

    #[test]
    fn test_unknown_policy_is_warning() {
        let file = FileExecutionConfig {
            on_layer_failure: "panic".to_string(),
            ..Default::default()
        };
        let (params, issues) = file.to_execution_params();
        assert!(!issues[0].is_error());
        assert_eq!(params.on_layer_failure, LayerFailurePolicy::Degrade);
    }
}
