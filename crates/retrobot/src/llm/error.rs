//! LLM error types.

use thiserror::Error;

/// Errors that can occur when making LLM API calls.
#[derive(Debug, Error)]
pub enum LLMError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The API reported an error in the middle of a stream
    #[error("stream error: {0}")]
    Stream(String),

    /// Every configured model failed to open a stream
    #[error("all models failed: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}
