//! LLM providers that produce the fragment streams the bot frames.

mod error;
mod fallback;
mod openai;
mod provider;
mod types;

pub use error::LLMError;
pub use fallback::FallbackChain;
pub use openai::OpenAICompatibleProvider;
pub use provider::{LLMProvider, into_fragments};
pub use types::{ChatRequest, ChatStream, FragmentStream, Message, Role, StreamEvent};
