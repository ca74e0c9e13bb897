//! Agent runtime
//!
//! An [`Agent`] binds an [`AgentSpec`] to the backend serving its model.
//! [`Agent::invoke`] and [`Agent::stream`] are single calls; the
//! `*_chunked` variants split an oversized `input` slot, retry each piece
//! under the chat's [`RetryPolicy`] and rejoin the results.

use crate::ports::model_backend::{BackendError, BackendGateway, ModelBackend, StreamHandle};
use crate::ports::observer::ChatObserver;
use crate::ports::transcript_logger::TranscriptLogger;
use crate::use_cases::retry::{RetryPolicy, retry_observed};
use moa_domain::chunking::join;
use moa_domain::{
    AgentSpec, Chunker, ChunkingError, ConfigError, Context, Message, StreamEvent, slots,
};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from a single agent
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AgentError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl AgentError {
    /// Only backend failures the backend considers transient are retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AgentError::Backend(e) => e.is_retryable(),
            AgentError::Chunking(_) | AgentError::Cancelled => false,
        }
    }

    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AgentError::Cancelled)
    }
}

/// Everything an invocation needs besides the context.
///
/// One set is created per chat and shared by every agent call in it.
#[derive(Clone)]
pub struct InvokeOptions {
    pub retry: RetryPolicy,
    pub chunker: Chunker,
    pub cancel: CancellationToken,
    pub observer: Arc<dyn ChatObserver>,
    pub logger: Arc<dyn TranscriptLogger>,
}

/// A model-backed generator with a fixed system template.
pub struct Agent {
    spec: AgentSpec,
    backend: Arc<dyn ModelBackend>,
}

impl Agent {
    pub fn new(spec: AgentSpec, backend: Arc<dyn ModelBackend>) -> Self {
        Self { spec, backend }
    }

    /// Resolve the spec's model through `gateway`.
    pub fn bind(spec: AgentSpec, gateway: &dyn BackendGateway) -> Result<Self, ConfigError> {
        let backend = gateway.resolve(&spec.model)?;
        Ok(Self::new(spec, backend))
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn spec(&self) -> &AgentSpec {
        &self.spec
    }

    /// System message rendered from the template, then the `input` slot as
    /// the user message.
    pub fn messages(&self, ctx: &Context) -> Vec<Message> {
        vec![
            Message::system(self.spec.template.render(ctx)),
            Message::user(ctx.input()),
        ]
    }

    /// One backend call.
    pub async fn invoke(&self, ctx: &Context) -> Result<String, AgentError> {
        let messages = self.messages(ctx);
        debug!(agent = %self.spec.name, model = %self.spec.model, "Invoking agent");
        let text = self
            .backend
            .generate(self.spec.model.name(), &messages, &self.spec.params)
            .await?;
        Ok(text)
    }

    /// One streaming backend call.
    pub async fn stream(&self, ctx: &Context) -> Result<StreamHandle, AgentError> {
        let messages = self.messages(ctx);
        debug!(agent = %self.spec.name, model = %self.spec.model, "Streaming agent");
        let handle = self
            .backend
            .generate_streaming(self.spec.model.name(), &messages, &self.spec.params)
            .await?;
        Ok(handle)
    }

    /// Chunked, retried [`invoke`](Self::invoke).
    pub async fn invoke_chunked(
        &self,
        ctx: &Context,
        opts: &InvokeOptions,
    ) -> Result<String, AgentError> {
        let chunks = opts.chunker.split(ctx.input())?;
        if chunks.len() > 1 {
            debug!(agent = %self.spec.name, chunks = chunks.len(), "Input split into chunks");
        }

        let mut outputs = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let chunk_ctx = &ctx.clone().with(slots::INPUT, chunk);
            let text = self
                .with_retry(opts, move || self.invoke_cancellable(chunk_ctx, &opts.cancel))
                .await?;
            outputs.push(text);
        }
        Ok(join(&outputs))
    }

    /// Chunked, retried [`stream`](Self::stream).
    ///
    /// Fragments are forwarded to the observer as they arrive; a space is
    /// forwarded between chunks so the fragments add up to the result.
    /// An attempt that fails mid-stream reports its forwarded text through
    /// `on_output_reset` before it is retried.
    pub async fn stream_chunked(
        &self,
        ctx: &Context,
        opts: &InvokeOptions,
    ) -> Result<String, AgentError> {
        let chunks = opts.chunker.split(ctx.input())?;

        let mut outputs = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.into_iter().enumerate() {
            if i > 0 {
                opts.observer.on_output_delta(" ");
            }
            let chunk_ctx = &ctx.clone().with(slots::INPUT, chunk);
            let text = self
                .with_retry(opts, move || self.consume_stream(chunk_ctx, opts))
                .await?;
            outputs.push(text);
        }
        Ok(join(&outputs))
    }

    async fn with_retry<T, Op, Fut>(&self, opts: &InvokeOptions, op: Op) -> Result<T, AgentError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AgentError>>,
    {
        let name = self.spec.name.as_str();
        let result = retry_observed(
            &opts.retry,
            Some(&opts.cancel),
            op,
            AgentError::is_retryable,
            |attempt, err| opts.observer.on_retry(name, attempt, &err.to_string()),
        )
        .await;

        match result {
            Err(_) if opts.cancel.is_cancelled() => Err(AgentError::Cancelled),
            other => other,
        }
    }

    async fn invoke_cancellable(
        &self,
        ctx: &Context,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            result = self.invoke(ctx) => result,
        }
    }

    async fn consume_stream(
        &self,
        ctx: &Context,
        opts: &InvokeOptions,
    ) -> Result<String, AgentError> {
        let handle = tokio::select! {
            biased;
            _ = opts.cancel.cancelled() => return Err(AgentError::Cancelled),
            handle = self.stream(ctx) => handle?,
        };
        let mut receiver = handle.receiver;
        let mut full_text = String::new();

        loop {
            let event = tokio::select! {
                biased;
                _ = opts.cancel.cancelled() => return Err(AgentError::Cancelled),
                event = receiver.recv() => event,
            };

            match event {
                Some(StreamEvent::Delta(chunk)) => {
                    opts.observer.on_output_delta(&chunk);
                    full_text.push_str(&chunk);
                }
                Some(StreamEvent::Completed(text)) => {
                    if full_text.is_empty() {
                        opts.observer.on_output_delta(&text);
                        full_text = text;
                    }
                    break;
                }
                Some(StreamEvent::Error(e)) => {
                    if !full_text.is_empty() {
                        opts.observer.on_output_reset(&full_text);
                    }
                    return Err(AgentError::Backend(BackendError::RequestFailed(e)));
                }
                None => break, // channel closed
            }
        }

        Ok(full_text)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("spec", &self.spec)
            .field("backend", &self.backend.name())
            .finish()
    }
}
