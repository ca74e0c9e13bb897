//! What the chat loop does after a layer has no surviving agent.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reaction to a layer whose agents all failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerFailurePolicy {
    /// Emit an error event for the cycle and continue with the last
    /// successful helper response.
    #[default]
    Degrade,
    /// Emit an error event for the cycle and end the chat there.
    FailFast,
}

impl LayerFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Degrade => "degrade",
            Self::FailFast => "fail_fast",
        }
    }
}

impl fmt::Display for LayerFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LayerFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "degrade" => Ok(Self::Degrade),
            "fail_fast" | "failfast" => Ok(Self::FailFast),
            other => Err(format!(
                "unknown layer failure policy '{}' (expected 'degrade' or 'fail_fast')",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("degrade".parse(), Ok(LayerFailurePolicy::Degrade));
        assert_eq!("fail-fast".parse(), Ok(LayerFailurePolicy::FailFast));
        assert_eq!("FAIL_FAST".parse(), Ok(LayerFailurePolicy::FailFast));
        assert!("abort".parse::<LayerFailurePolicy>().is_err());
    }

    #[test]
    fn test_default_degrades() {
        assert_eq!(LayerFailurePolicy::default(), LayerFailurePolicy::Degrade);
        assert_eq!(LayerFailurePolicy::FailFast.to_string(), "fail_fast");
    }
}
