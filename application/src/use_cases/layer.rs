//! Layer fan-out / fan-in
//!
//! Every agent of a [`Layer`] runs as its own task on the same context.
//! The layer waits for all of them, drops the ones that failed, and merges
//! the rest, in configuration order, through the reference template.

use crate::ports::model_backend::BackendGateway;
use crate::ports::transcript_logger::TranscriptEvent;
use crate::use_cases::agent::{Agent, AgentError, InvokeOptions};
use moa_domain::{ConfigError, Context, LayerSpec, MergeResult, PromptTemplate};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Errors from a whole layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayerError {
    #[error("All {attempted} agents of the layer failed")]
    Exhausted {
        attempted: usize,
        /// `(agent, error)` in configuration order.
        failures: Vec<(String, String)>,
    },

    #[error("Operation cancelled")]
    Cancelled,
}

/// Ordered agents invoked concurrently.
#[derive(Debug)]
pub struct Layer {
    agents: Vec<Arc<Agent>>,
}

impl Layer {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            agents: agents.into_iter().map(Arc::new).collect(),
        }
    }

    /// Resolve every agent of `spec` through `gateway`.
    pub fn bind(spec: &LayerSpec, gateway: &dyn BackendGateway) -> Result<Self, ConfigError> {
        let agents = spec
            .agents()
            .iter()
            .map(|agent| Agent::bind(agent.clone(), gateway))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(agents))
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Run all agents on `ctx` and merge the survivors.
    ///
    /// `cycle` is only used for progress reporting and logs.
    pub async fn invoke(
        &self,
        ctx: &Context,
        reference: &PromptTemplate,
        cycle: usize,
        opts: &InvokeOptions,
    ) -> Result<MergeResult, LayerError> {
        let mut join_set = JoinSet::new();

        for (index, agent) in self.agents.iter().enumerate() {
            let agent = Arc::clone(agent);
            let ctx = ctx.clone();
            let opts = opts.clone();

            join_set.spawn(async move {
                let result = agent.invoke_chunked(&ctx, &opts).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<String, AgentError>>> =
            (0..self.agents.len()).map(|_| None).collect();

        loop {
            let joined = tokio::select! {
                biased;
                _ = opts.cancel.cancelled() => {
                    join_set.abort_all();
                    return Err(LayerError::Cancelled);
                }
                joined = join_set.join_next() => joined,
            };

            let Some(joined) = joined else {
                break;
            };

            match joined {
                Ok((index, result)) => {
                    let name = self.agents[index].name();
                    match &result {
                        Ok(_) => info!(cycle, agent = %name, "Agent responded"),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!(cycle, agent = %name, "Agent failed: {}", e),
                    }
                    opts.observer.on_agent_complete(cycle, name, result.is_ok());
                    results[index] = Some(result);
                }
                Err(e) => {
                    warn!(cycle, "Agent task join error: {}", e);
                }
            }
        }

        let mut outputs = Vec::new();
        let mut failures = Vec::new();
        for (agent, result) in self.agents.iter().zip(results) {
            let name = agent.name().to_string();
            match result {
                Some(Ok(text)) => outputs.push((name, text)),
                Some(Err(AgentError::Cancelled)) => return Err(LayerError::Cancelled),
                Some(Err(e)) => {
                    opts.logger.log(TranscriptEvent::new(
                        "agent_failed",
                        serde_json::json!({
                            "cycle": cycle,
                            "agent": name,
                            "error": e.to_string(),
                        }),
                    ));
                    failures.push((name, e.to_string()));
                }
                None => failures.push((name, "task aborted".to_string())),
            }
        }

        if outputs.is_empty() {
            return Err(LayerError::Exhausted {
                attempted: self.agents.len(),
                failures,
            });
        }

        let failed = failures.into_iter().map(|(name, _)| name).collect();
        Ok(MergeResult::merge(reference, ctx, outputs, failed))
    }
}
