pub mod mistral;

pub use mistral::MistralClient;

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::persona;
use crate::state::ChatMessage;

/// One incremental piece of generated text.
///
/// Every provider adapter maps its own chunk shape into this type; the relay
/// and the client only ever see fragments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub content: String,
}

impl Fragment {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, ProviderError>> + Send>>;

/// A streaming chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Request with the assistant's fixed model and sampling parameters.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            model: persona::MODEL.to_string(),
            messages,
            temperature: persona::TEMPERATURE,
            max_tokens: persona::MAX_TOKENS,
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Open a streaming completion.
    ///
    /// Errors returned here happen before any output was produced (transport
    /// failure, rejected request). Errors yielded by the stream happen mid-way.
    async fn stream_chat(&self, request: CompletionRequest) -> Result<FragmentStream, ProviderError>;
}
