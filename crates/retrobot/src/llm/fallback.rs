//! Ordered model fallback.
//!
//! Models are tried in order until one opens a stream. A stream that breaks
//! off after opening is not retried on the next model: the partial answer
//! has already been shown.

use std::sync::Arc;

use reqwest::Client;
use tracing::{debug, warn};

use super::error::LLMError;
use super::openai::OpenAICompatibleProvider;
use super::provider::{LLMProvider, into_fragments};
use super::types::{ChatRequest, FragmentStream};
use crate::config::LlmConfig;

struct Entry {
    provider: Arc<dyn LLMProvider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

/// Providers to try, in priority order.
#[derive(Default)]
pub struct FallbackChain {
    entries: Vec<Entry>,
}

impl FallbackChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one OpenAI-compatible provider per configured model, sharing a
    /// single HTTP client.
    #[must_use]
    pub fn from_config(config: &LlmConfig) -> Self {
        let client = Client::new();
        let mut chain = Self::new();
        for model in &config.models {
            let provider = OpenAICompatibleProvider::from_config(client.clone(), model);
            chain.push(
                Arc::new(provider),
                model.model.clone(),
                model.temperature,
                model.max_tokens,
            );
        }
        chain
    }

    /// Append a provider with the model and sampling settings to request.
    pub fn push(
        &mut self,
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) {
        self.entries.push(Entry {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Open a fragment stream for `prompt` on the first provider that
    /// accepts the request.
    pub async fn open(&self, prompt: &str) -> Result<FragmentStream, LLMError> {
        let mut failures = Vec::with_capacity(self.entries.len());

        for entry in &self.entries {
            let request = ChatRequest::prompt(&entry.model, prompt)
                .with_temperature(entry.temperature)
                .with_max_tokens(entry.max_tokens);

            match entry.provider.chat_stream(request).await {
                Ok(stream) => {
                    debug!(provider = entry.provider.name(), model = %entry.model, "stream opened");
                    return Ok(into_fragments(stream));
                }
                Err(e) => {
                    warn!(
                        provider = entry.provider.name(),
                        model = %entry.model,
                        error = %e,
                        "model failed, trying next"
                    );
                    failures.push(format!("{}: {}", entry.provider.name(), e));
                }
            }
        }

        Err(LLMError::Exhausted(failures))
    }
}
