//! OpenAI-compatible LLM provider.
//!
//! Works with OpenAI, Ollama (`/v1`) and Gemini through Google's
//! OpenAI-compatible endpoint.

use std::pin::Pin;
use std::task::{Context, Poll};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LLMError;
use super::provider::LLMProvider;
use super::types::{ChatRequest, ChatStream, Message, StreamEvent};
use crate::config::ModelConfig;
use crate::sse::SseStream;

/// OpenAI-compatible provider.
pub struct OpenAICompatibleProvider {
    name: String,
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleProvider {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        client: Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    #[must_use]
    pub fn from_config(client: Client, model: &ModelConfig) -> Self {
        Self::new(
            model.name.clone(),
            client,
            model.base_url.clone(),
            model.resolve_api_key(),
        )
    }
}

#[async_trait]
impl LLMProvider for OpenAICompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LLMError> {
        let url = format!("{}/chat/completions", self.base_url);

        let stream_request = StreamRequest {
            model: request.model,
            messages: request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: true,
        };

        let mut req = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        let response = req.json(&stream_request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, message });
        }

        let sse_stream = SseStream::new(response.bytes_stream());
        Ok(Box::pin(OpenAIStreamAdapter::new(sse_stream)))
    }
}

// ============================================================================
// Streaming Types
// ============================================================================

#[derive(Serialize)]
struct StreamRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Converts SSE events into [`StreamEvent`]s.
struct OpenAIStreamAdapter<S> {
    inner: SseStream<S>,
    done: bool,
}

impl<S> OpenAIStreamAdapter<S> {
    fn new(inner: SseStream<S>) -> Self {
        Self { inner, done: false }
    }

    /// Decode one `data:` payload. `None` means "nothing to emit".
    fn decode(&mut self, data: &str) -> Option<Result<StreamEvent, LLMError>> {
        if data.is_empty() {
            return None;
        }
        if data == "[DONE]" {
            self.done = true;
            return Some(Ok(StreamEvent::Done));
        }

        match serde_json::from_str::<StreamChunk>(data) {
            Ok(StreamChunk {
                error: Some(error), ..
            }) => {
                self.done = true;
                Some(Err(LLMError::Stream(error.message)))
            }
            Ok(chunk) => chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .filter(|content| !content.is_empty())
                .map(|content| Ok(StreamEvent::Token(content))),
            Err(e) => {
                tracing::debug!(data = %data, error = %e, "failed to parse SSE chunk");
                None
            }
        }
    }
}

impl<S> Stream for OpenAIStreamAdapter<S>
where
    S: Stream<Item = Result<Bytes, reqwest::Error>> + Unpin,
{
    type Item = Result<StreamEvent, LLMError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.done {
            return Poll::Ready(None);
        }

        loop {
            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Some(item) = self.decode(&event.data) {
                        return Poll::Ready(Some(item));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(LLMError::Request(e))));
                }
                Poll::Ready(None) => {
                    // Some servers close without sending [DONE].
                    self.done = true;
                    return Poll::Ready(Some(Ok(StreamEvent::Done)));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// OpenAI SSE stream chunk.
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    #[serde(default)]
    error: Option<StreamError>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamError {
    message: String,
}
