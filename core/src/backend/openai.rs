//! OpenAI Backend Implementation
//!
//! Chat-model backend for the OpenAI chat completions API (and
//! compatible servers via a base URL override).
//!
//! # Wire format
//!
//! `POST {base}/v1/chat/completions` with `"stream": true`. The response
//! is a server-sent-event stream of `data: {json}` lines; each chunk
//! carries the next fragment in `choices[0].delta.content`, and the
//! stream ends with `data: [DONE]`.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::traits::{ChatBackend, ChatRequest, StreamEvent};
use crate::transcript::Speaker;

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI backend client.
#[derive(Clone)]
pub struct OpenAiBackend {
    /// API key, sent as a bearer token.
    api_key: String,
    /// Base URL, overridable for compatible servers.
    base_url: String,
    /// HTTP client.
    http_client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a new OpenAI backend.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Override the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create from environment variables.
    ///
    /// # Errors
    ///
    /// Fails when `OPENAI_API_KEY` is unset; the message points at where
    /// to get a key.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            anyhow::anyhow!(
                "OPENAI_API_KEY is not set. Grab a key from \
                 https://platform.openai.com/account/api-keys"
            )
        })?;

        let mut backend = Self::new(api_key);
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            backend = backend.with_base_url(base_url);
        }

        Ok(backend)
    }

    /// Chat completions endpoint URL.
    fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Build the `messages` array for a request: the system instruction,
/// then the prior turns in order, then the new input.
fn build_messages(request: &ChatRequest) -> Vec<serde_json::Value> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);

    if let Some(ref system) = request.system {
        messages.push(serde_json::json!({ "role": "system", "content": system }));
    }

    for turn in &request.history {
        let role = match turn.speaker {
            Speaker::Human => "user",
            Speaker::Assistant => "assistant",
        };
        messages.push(serde_json::json!({ "role": role, "content": turn.text }));
    }

    messages.push(serde_json::json!({ "role": "user", "content": request.input }));
    messages
}

/// What one SSE line means.
#[derive(Debug, PartialEq)]
enum SsePayload {
    /// A response fragment (may be empty).
    Token(String),
    /// `data: [DONE]`, the stream is over.
    Done,
    /// The API reported an error mid-stream.
    ApiError(String),
    /// Keep-alive, non-data line, or a chunk without content.
    Ignore,
}

/// Interpret one line of the SSE response body.
fn parse_sse_line(line: &str) -> SsePayload {
    let Some(payload) = line.strip_prefix("data:") else {
        return SsePayload::Ignore;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return SsePayload::Done;
    }

    let Ok(data) = serde_json::from_str::<serde_json::Value>(payload) else {
        return SsePayload::Ignore;
    };

    if let Some(error) = data.get("error") {
        let message = error
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or("the API reported an error");
        return SsePayload::ApiError(message.to_string());
    }

    match data
        .pointer("/choices/0/delta/content")
        .and_then(serde_json::Value::as_str)
    {
        Some(token) => SsePayload::Token(token.to_string()),
        None => SsePayload::Ignore,
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "OpenAI"
    }

    async fn send_streaming(
        &self,
        request: &ChatRequest,
    ) -> anyhow::Result<mpsc::Receiver<StreamEvent>> {
        let (tx, rx) = mpsc::channel(100);

        let url = self.chat_url();
        let json_request = serde_json::json!({
            "model": request.model,
            "messages": build_messages(request),
            "temperature": request.temperature,
            "stream": true,
        });

        let http_client = self.http_client.clone();
        let api_key = self.api_key.clone();

        // The request runs in the background so the caller can start
        // consuming (and timing) the stream immediately; failures arrive
        // on the channel.
        tokio::spawn(async move {
            let response = match http_client
                .post(&url)
                .bearer_auth(&api_key)
                .json(&json_request)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    let _ = tx.send(StreamEvent::Error(format!("request failed: {e}"))).await;
                    return;
                }
            };

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let _ = tx
                    .send(StreamEvent::Error(format!("OpenAI returned {status}: {body}")))
                    .await;
                return;
            }

            let mut stream = response.bytes_stream();
            let mut buffer = String::new();
            let mut full_response = String::new();

            while let Some(chunk) = stream.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx.send(StreamEvent::Error(format!("stream error: {e}"))).await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // SSE data lines are newline-delimited single-line JSON
                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);

                    match parse_sse_line(&line) {
                        SsePayload::Token(token) => {
                            full_response.push_str(&token);
                            if tx.send(StreamEvent::Token(token)).await.is_err() {
                                // Receiver dropped, stop streaming
                                return;
                            }
                        }
                        SsePayload::Done => {
                            let _ = tx
                                .send(StreamEvent::Complete {
                                    message: full_response,
                                })
                                .await;
                            return;
                        }
                        SsePayload::ApiError(message) => {
                            let _ = tx.send(StreamEvent::Error(message)).await;
                            return;
                        }
                        SsePayload::Ignore => {}
                    }
                }
            }

            // The server closed the stream without a [DONE] marker.
            // Treat what we have as the complete response.
            tracing::debug!("stream closed without terminator");
            let _ = tx
                .send(StreamEvent::Complete {
                    message: full_response,
                })
                .await;
        });

        Ok(rx)
    }
}
