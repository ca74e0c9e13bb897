//! Execution parameters for the chat loop.
//!
//! [`ExecutionParams`] groups the static parameters that control how the
//! [`Orchestrator`](crate::use_cases::orchestrator::Orchestrator) runs a
//! chat. These are application-layer concerns, not part of the agent
//! definitions in [`MoaConfig`](moa_domain::MoaConfig).

use crate::use_cases::retry::RetryPolicy;
use moa_domain::{ChunkConfig, LayerFailurePolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Character bounds applied to context slots that are never chunked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLimits {
    /// Bound on the `helper_response` slot.
    pub max_helper_chars: usize,
    /// Bound on the `transcript` slot.
    pub max_transcript_chars: usize,
}

impl Default for ContextLimits {
    fn default() -> Self {
        Self {
            max_helper_chars: 24_000,
            max_transcript_chars: 16_000,
        }
    }
}

/// Chat loop control parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Applied to every agent call and every final-stage stream.
    pub retry: RetryPolicy,
    /// Token bounds for the `input` slot.
    pub chunking: ChunkConfig,
    pub limits: ContextLimits,
    /// What happens after a cycle in which every agent failed.
    pub on_layer_failure: LayerFailurePolicy,
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_retry(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.retry = RetryPolicy::new(max_attempts, delay);
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkConfig) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_limits(mut self, limits: ContextLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_layer_failure(mut self, policy: LayerFailurePolicy) -> Self {
        self.on_layer_failure = policy;
        self
    }
}
