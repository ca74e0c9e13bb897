//! Configuration issues reported before an orchestrator is built.
//!
//! [`MoaConfig::validate`](super::MoaConfig::validate) collects every
//! problem at once instead of stopping at the first, so the CLI can show
//! the whole list. Errors block construction; warnings are printed and
//! ignored.

use super::error::ConfigError;

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigIssueCode {
    EmptyModelName,
    InvalidModel,
    UnknownTemplate,
    InvalidCycles,
    TemperatureOutOfRange,
    MissingMergeSlot,
    UnknownBackend,
    DuplicateAgent,
    EmptyLayer,
    InvalidChunking,
    /// A layer agent's template never reads `{helper_response}`, so later
    /// cycles cannot see earlier ones.
    HelperResponseUnused,
    /// A key in the file that nothing reads.
    UnknownKey,
    Other,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<&ConfigError> for ConfigIssue {
    fn from(err: &ConfigError) -> Self {
        let code = match err {
            ConfigError::EmptyModelName => ConfigIssueCode::EmptyModelName,
            ConfigError::InvalidModel(_) => ConfigIssueCode::InvalidModel,
            ConfigError::UnknownTemplate(_) => ConfigIssueCode::UnknownTemplate,
            ConfigError::InvalidCycles => ConfigIssueCode::InvalidCycles,
            ConfigError::TemperatureOutOfRange { .. } => ConfigIssueCode::TemperatureOutOfRange,
            ConfigError::MissingMergeSlot(_) => ConfigIssueCode::MissingMergeSlot,
            ConfigError::UnknownBackend { .. } | ConfigError::NoBackend(_) => {
                ConfigIssueCode::UnknownBackend
            }
            ConfigError::DuplicateAgent(_) => ConfigIssueCode::DuplicateAgent,
            ConfigError::EmptyLayer => ConfigIssueCode::EmptyLayer,
            ConfigError::Chunking(_) => ConfigIssueCode::InvalidChunking,
            ConfigError::Invalid(_) => ConfigIssueCode::Other,
        };
        Self::error(code, err.to_string())
    }
}

impl From<ConfigError> for ConfigIssue {
    fn from(err: ConfigError) -> Self {
        Self::from(&err)
    }
}

/// First error-level issue, as a [`ConfigError`].
pub fn first_error(issues: &[ConfigIssue]) -> Option<ConfigError> {
    issues
        .iter()
        .find(|i| i.is_error())
        .map(|i| ConfigError::Invalid(i.message.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_from_error() {
        let issue = ConfigIssue::from(ConfigError::InvalidCycles);
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.code, ConfigIssueCode::InvalidCycles);
        assert_eq!(issue.message, "cycles must be at least 1");
    }

    #[test]
    fn test_first_error_skips_warnings() {
        let issues = vec![
            ConfigIssue::warning(ConfigIssueCode::UnknownKey, "unknown key 'foo'"),
            ConfigIssue::from(ConfigError::EmptyLayer),
        ];
        assert_eq!(
            first_error(&issues),
            Some(ConfigError::Invalid("layer has no agents".to_string()))
        );
        assert_eq!(first_error(&issues[..1]), None);
    }
}
