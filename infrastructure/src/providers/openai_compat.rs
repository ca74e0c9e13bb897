//! OpenAI-compatible chat completions backend.
//!
//! Works with Groq, OpenAI, Together, OpenRouter, Ollama, vLLM and any other
//! endpoint exposing `POST {base_url}/chat/completions`, including SSE
//! streaming (`data: {...}` lines terminated by `data: [DONE]`).

use crate::config::FileHttpBackendConfig;
use async_trait::async_trait;
use futures::StreamExt;
use moa_application::ports::model_backend::{BackendError, ModelBackend, StreamHandle};
use moa_domain::{GenerationParams, Message, StreamEvent};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

const STREAM_BUFFER: usize = 64;

pub struct OpenAiCompatBackend {
    name: String,
    base_url: String,
    api_key: Option<String>,
    /// Only used in error messages when no key is available.
    api_key_env: String,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            api_key_env: String::new(),
            client,
        })
    }

    pub fn from_config(
        name: impl Into<String>,
        config: &FileHttpBackendConfig,
    ) -> Result<Self, BackendError> {
        let mut backend = Self::new(
            name,
            config.base_url.clone(),
            config.resolve_api_key(),
            Duration::from_secs(config.timeout_secs),
        )?;
        backend.api_key_env = config.api_key_env.clone();
        Ok(backend)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A per-agent key wins over the backend's own.
    fn api_key<'a>(&'a self, params: &'a GenerationParams) -> Result<&'a str, BackendError> {
        params
            .api_key
            .as_ref()
            .map(|key| key.expose())
            .or(self.api_key.as_deref())
            .ok_or_else(|| {
                let hint = if self.api_key_env.is_empty() {
                    String::new()
                } else {
                    format!(" (set {})", self.api_key_env)
                };
                BackendError::Auth(format!("no API key for backend '{}'{}", self.name, hint))
            })
    }

    fn request_body(
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
        stream: bool,
    ) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": params.temperature,
            "stream": stream,
        });
        if let Some(max_tokens) = params.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        body
    }

    async fn send(
        &self,
        body: &serde_json::Value,
        params: &GenerationParams,
    ) -> Result<reqwest::Response, BackendError> {
        let url = format!("{}/chat/completions", self.base_url);
        let api_key = self.api_key(params)?;

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(response);
        }

        let error_body = response.text().await.unwrap_or_default();
        warn!(backend = %self.name, status, body = %error_body, "Backend returned error");
        Err(map_status(status, error_body))
    }
}

fn map_transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Connection(e.to_string())
    }
}

fn map_status(status: u16, body: String) -> BackendError {
    match status {
        429 => BackendError::RateLimited(body),
        401 | 403 => BackendError::Auth(format!("HTTP {status}: {body}")),
        400 | 404 | 422 => BackendError::InvalidRequest(format!("HTTP {status}: {body}")),
        _ => BackendError::RequestFailed(format!("HTTP {status}: {body}")),
    }
}

// ==================== Wire types ====================

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// What one SSE line means for the stream.
#[derive(Debug, PartialEq, Eq)]
enum SseLine {
    Content(String),
    Done,
    Skip,
}

fn parse_sse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<StreamChunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content)
            .filter(|content| !content.is_empty())
            .map_or(SseLine::Skip, SseLine::Content),
        Err(e) => {
            trace!(data = %data, error = %e, "Ignoring unparseable SSE chunk");
            SseLine::Skip
        }
    }
}

/// Splits a byte stream into complete lines.
///
/// Bytes are kept until a `\n` arrives, so a UTF-8 character split across
/// network chunks is decoded whole.
#[derive(Default)]
struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line[..end]);
            lines.push(line.trim_end_matches('\r').to_string());
        }
        lines
    }

    fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buffer);
        let rest = String::from_utf8_lossy(&rest);
        let rest = rest.trim();
        (!rest.is_empty()).then(|| rest.to_string())
    }
}

#[async_trait]
impl ModelBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(
        &self,
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<String, BackendError> {
        debug!(backend = %self.name, model, "Sending completion request");
        let body = Self::request_body(model, messages, params, false);
        let response = self.send(&body, params).await?;

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| BackendError::RequestFailed(format!("Failed to parse response: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| BackendError::RequestFailed("No choices in response".to_string()))
    }

    async fn generate_streaming(
        &self,
        model: &str,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<StreamHandle, BackendError> {
        debug!(backend = %self.name, model, "Sending streaming request");
        let body = Self::request_body(model, messages, params, true);
        let response = self.send(&body, params).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(async move {
            let mut bytes_stream = response.bytes_stream();
            let mut lines = LineBuffer::default();
            let mut full_text = String::new();

            while let Some(chunk) = bytes_stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                        return;
                    }
                };

                for line in lines.push(&bytes) {
                    match parse_sse_line(&line) {
                        SseLine::Content(text) => {
                            full_text.push_str(&text);
                            if tx.send(StreamEvent::Delta(text)).await.is_err() {
                                return;
                            }
                        }
                        SseLine::Done => {
                            let _ = tx.send(StreamEvent::Completed(full_text)).await;
                            return;
                        }
                        SseLine::Skip => {}
                    }
                }
            }

            if let Some(line) = lines.finish()
                && let SseLine::Content(text) = parse_sse_line(&line)
            {
                full_text.push_str(&text);
                let _ = tx.send(StreamEvent::Delta(text)).await;
            }
            let _ = tx.send(StreamEvent::Completed(full_text)).await;
        });

        Ok(StreamHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moa_domain::ApiKey;

    fn backend(api_key: Option<&str>) -> OpenAiCompatBackend {
        OpenAiCompatBackend::new(
            "groq",
            "https://api.groq.com/openai/v1/",
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        assert_eq!(backend(None).base_url(), "https://api.groq.com/openai/v1");
    }

    #[test]
    fn test_request_body() {
        let params = GenerationParams::new(0.3).with_max_tokens(64);
        let body = OpenAiCompatBackend::request_body(
            "llama3",
            &[Message::system("s"), Message::user("u")],
            &params,
            true,
        );
        assert_eq!(body["model"], "llama3");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "u");
        assert_eq!(body["max_tokens"], 64);
        assert_eq!(body["stream"], true);
    }

    #[test]
    fn test_request_body_without_max_tokens() {
        let body = OpenAiCompatBackend::request_body(
            "m",
            &[],
            &GenerationParams::default(),
            false,
        );
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_agent_key_overrides_backend_key() {
        let backend = backend(Some("backend-key"));
        let params = GenerationParams::default().with_api_key(ApiKey::new("agent-key"));
        assert_eq!(backend.api_key(&params).unwrap(), "agent-key");
        assert_eq!(
            backend.api_key(&GenerationParams::default()).unwrap(),
            "backend-key"
        );
    }

    #[test]
    fn test_missing_key_is_auth_error() {
        let mut backend = backend(None);
        backend.api_key_env = "GROQ_API_KEY".to_string();
        let err = backend.api_key(&GenerationParams::default()).unwrap_err();
        assert!(matches!(err, BackendError::Auth(ref m) if m.contains("GROQ_API_KEY")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(429, String::new()),
            BackendError::RateLimited(_)
        ));
        assert!(matches!(map_status(401, String::new()), BackendError::Auth(_)));
        assert!(matches!(
            map_status(400, String::new()),
            BackendError::InvalidRequest(_)
        ));
        let err = map_status(503, "overloaded".to_string());
        assert!(err.is_retryable());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_parse_sse_lines() {
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#),
            SseLine::Content("Hel".to_string())
        );
        assert_eq!(parse_sse_line("data: [DONE]"), SseLine::Done);
        assert_eq!(
            parse_sse_line(r#"data: {"choices":[{"delta":{"role":"assistant"}}]}"#),
            SseLine::Skip
        );
        assert_eq!(parse_sse_line(": keep-alive"), SseLine::Skip);
        assert_eq!(parse_sse_line("data: not json"), SseLine::Skip);
    }

    #[test]
    fn test_line_buffer_handles_split_chunks() {
        let mut lines = LineBuffer::default();
        assert!(lines.push(b"data: {\"a\"").is_empty());
        let out = lines.push(b":1}\r\n\ndata: [DO");
        assert_eq!(out, vec!["data: {\"a\":1}".to_string(), String::new()]);
        assert!(lines.push(b"NE]").is_empty());
        assert_eq!(lines.finish().as_deref(), Some("data: [DONE]"));
        assert!(lines.finish().is_none());
    }

    #[test]
    fn test_line_buffer_keeps_split_multibyte_char() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"}}]}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = LineBuffer::default();
        assert!(lines.push(&line[..split]).is_empty());
        let out = lines.push(&line[split..]);
        assert_eq!(out.len(), 1);
        assert_eq!(parse_sse_line(&out[0]), SseLine::Content("café".to_string()));
    }
}
