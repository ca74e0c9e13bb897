//! Model backend port
//!
//! Defines how agents reach a text-generation backend, and how a model
//! reference is turned into one.

use async_trait::async_trait;
use moa_domain::{ConfigError, GenerationParams, Message, ModelRef, StreamEvent};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors that can occur while talking to a backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Timeout")]
    Timeout,
}

impl BackendError {
    /// Whether another attempt could succeed.
    ///
    /// Authentication and malformed requests fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, BackendError::Auth(_) | BackendError::InvalidRequest(_))
    }
}

/// Handle for receiving streaming events from a backend.
///
/// Wraps an `mpsc::Receiver<StreamEvent>` and provides convenience methods
/// for consuming the stream.
pub struct StreamHandle {
    pub receiver: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self { receiver }
    }

    /// Handle that yields a single `Completed` event.
    pub fn completed(text: String) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this cannot fail.
        let _ = tx.try_send(StreamEvent::Completed(text));
        Self::new(rx)
    }

    /// Consume the stream and collect all text into a single string.
    pub async fn collect_text(mut self) -> Result<String, BackendError> {
        let mut full_text = String::new();
        while let Some(event) = self.receiver.recv().await {
            match event {
                StreamEvent::Delta(chunk) => full_text.push_str(&chunk),
                StreamEvent::Completed(text) => {
                    if full_text.is_empty() {
                        return Ok(text);
                    }
                    return Ok(full_text);
                }
                StreamEvent::Error(e) => {
                    return Err(BackendError::RequestFailed(e));
                }
            }
        }
        // Channel closed without Completed; return what we have
        Ok(full_text)
    }
}

/// A text-generation backend serving one or more models.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Backend identifier used in `backend/model` references.
    fn name(&self) -> &str;

    /// Generate a complete response.
    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, BackendError>;

    /// Generate a streaming response.
    ///
    /// Default implementation calls `generate()` and wraps the result in a
    /// single `Completed` event.
    async fn generate_streaming(
        &self,
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<StreamHandle, BackendError> {
        let text = self.generate(model, messages, params).await?;
        Ok(StreamHandle::completed(text))
    }
}

/// Resolves model references to backends.
pub trait BackendGateway: Send + Sync {
    /// Backend serving `model`; an unknown backend is a configuration error.
    fn resolve(&self, model: &ModelRef) -> Result<Arc<dyn ModelBackend>, ConfigError>;
}
