//! LLM provider trait.

use async_trait::async_trait;
use futures::StreamExt;
use futures::future::ready;

use super::error::LLMError;
use super::types::{ChatRequest, ChatStream, FragmentStream, StreamEvent};

/// A chat completion backend.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Start a streaming chat completion.
    ///
    /// Errors returned here mean the stream never opened; errors inside the
    /// stream mean it broke off after opening.
    async fn chat_stream(&self, request: ChatRequest) -> Result<ChatStream, LLMError>;
}

/// Keep only generated text, ending at [`StreamEvent::Done`].
pub fn into_fragments(stream: ChatStream) -> FragmentStream {
    Box::pin(
        stream
            .take_while(|event| ready(!matches!(event, Ok(StreamEvent::Done))))
            .filter_map(|event| {
                ready(match event {
                    Ok(StreamEvent::Token(text)) if !text.is_empty() => Some(Ok(text)),
                    Ok(_) => None,
                    Err(e) => Some(Err(e)),
                })
            }),
    )
}
