//! Orchestration value objects - results of a layer and the event protocol.
//!
//! - [`MergeResult`] - a layer's surviving outputs and their aggregated text
//! - [`ResponseEvent`] - one unit of the streamed chat output

use crate::context::{Context, slots};
use crate::prompt::PromptTemplate;
use serde::{Deserialize, Serialize};

/// Output of one layer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    /// Reference template rendered with the numbered outputs.
    pub aggregated_text: String,
    /// Outputs of the agents that succeeded, in layer order.
    pub individual_outputs: Vec<String>,
    /// Names of the agents behind `individual_outputs`, same order.
    #[serde(default)]
    pub contributors: Vec<String>,
    /// Names of the agents that were excluded after failing.
    #[serde(default)]
    pub failed: Vec<String>,
}

impl MergeResult {
    /// Merge `(agent, output)` pairs that are already in layer order.
    ///
    /// `ctx` supplies the other slots the reference template may mention;
    /// its `helper_response` is replaced by the numbered outputs.
    pub fn merge(
        reference: &PromptTemplate,
        ctx: &Context,
        outputs: Vec<(String, String)>,
        failed: Vec<String>,
    ) -> Self {
        let (contributors, individual_outputs): (Vec<_>, Vec<_>) = outputs.into_iter().unzip();
        let numbered = Self::numbered(&individual_outputs);
        let merge_ctx = ctx.clone().with(slots::HELPER_RESPONSE, numbered);
        Self {
            aggregated_text: reference.render(&merge_ctx),
            individual_outputs,
            contributors,
            failed,
        }
    }

    /// `"1. a\n2. b"` numbering used inside the reference template.
    pub fn numbered<S: AsRef<str>>(outputs: &[S]) -> String {
        outputs
            .iter()
            .enumerate()
            .map(|(i, out)| format!("{}. {}", i + 1, out.as_ref()))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A unit of the streamed chat output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseEvent {
    /// A cycle finished; `text` is its aggregated text.
    Intermediate {
        text: String,
        layer_index: usize,
        #[serde(default)]
        outputs: Vec<String>,
    },
    /// The final synthesized answer.
    Output { text: String },
    /// A cycle failed (`layer_index` set) or the final stage failed.
    Error {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        layer_index: Option<usize>,
    },
}

impl ResponseEvent {
    /// Intermediate event for the 1-based `layer_index`.
    pub fn intermediate(merge: &MergeResult, layer_index: usize) -> Self {
        Self::Intermediate {
            text: merge.aggregated_text.clone(),
            layer_index,
            outputs: merge.individual_outputs.clone(),
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::Output { text: text.into() }
    }

    pub fn layer_error(text: impl Into<String>, layer_index: usize) -> Self {
        Self::Error {
            text: text.into(),
            layer_index: Some(layer_index),
        }
    }

    pub fn final_error(text: impl Into<String>) -> Self {
        Self::Error {
            text: text.into(),
            layer_index: None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Intermediate { text, .. } | Self::Output { text } | Self::Error { text, .. } => {
                text
            }
        }
    }

    pub fn layer_index(&self) -> Option<usize> {
        match self {
            Self::Intermediate { layer_index, .. } => Some(*layer_index),
            Self::Error { layer_index, .. } => *layer_index,
            Self::Output { .. } => None,
        }
    }

    /// `Output`, or an `Error` raised by the final stage.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            Self::Output { .. }
                | Self::Error {
                    layer_index: None,
                    ..
                }
        )
    }
}
