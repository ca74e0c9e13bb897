//! Offline backend that answers with the user's message.
//!
//! Always registered as `echo`. Useful for trying the pipeline without an
//! API key and for deterministic end-to-end tests.

use async_trait::async_trait;
use moa_application::ports::model_backend::{BackendError, ModelBackend, StreamHandle};
use moa_domain::{GenerationParams, Message, Role, StreamEvent};
use tokio::sync::mpsc;

pub struct EchoBackend {
    name: String,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self::named(super::ECHO_BACKEND)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `[model] <last user message>`
    fn reply(model: &str, messages: &[Message]) -> String {
        let input = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        format!("[{}] {}", model, input)
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelBackend for EchoBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<String, BackendError> {
        Ok(Self::reply(model, messages))
    }

    /// Streams the reply word by word, then `Completed` with the whole text.
    async fn generate_streaming(
        &self,
        model: &str,
        messages: &[Message],
        _params: &GenerationParams,
    ) -> Result<StreamHandle, BackendError> {
        let text = Self::reply(model, messages);
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            for piece in text.split_inclusive(' ') {
                if tx.send(StreamEvent::Delta(piece.to_string())).await.is_err() {
                    return;
                }
            }
            let _ = tx.send(StreamEvent::Completed(text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages() -> Vec<Message> {
        vec![Message::system("be brief"), Message::user("hello there")]
    }

    #[tokio::test]
    async fn test_generate_echoes_user_message() {
        let backend = EchoBackend::new();
        let text = backend
            .generate("m1", &messages(), &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "[m1] hello there");
        assert_eq!(backend.name(), "echo");
    }

    #[tokio::test]
    async fn test_streaming_deltas_add_up() {
        let backend = EchoBackend::new();
        let mut handle = backend
            .generate_streaming("m1", &messages(), &GenerationParams::default())
            .await
            .unwrap();

        let mut deltas = String::new();
        let mut completed = None;
        while let Some(event) = handle.receiver.recv().await {
            match event {
                StreamEvent::Delta(d) => deltas.push_str(&d),
                StreamEvent::Completed(text) => completed = Some(text),
                StreamEvent::Error(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(deltas, "[m1] hello there");
        assert_eq!(completed.as_deref(), Some("[m1] hello there"));
    }

    #[tokio::test]
    async fn test_no_user_message() {
        let text = EchoBackend::new()
            .generate("m", &[Message::system("s")], &GenerationParams::default())
            .await
            .unwrap();
        assert_eq!(text, "[m] ");
    }
}
