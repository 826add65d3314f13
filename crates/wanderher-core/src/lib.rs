pub mod ai;
pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod persona;
pub mod relay;
pub mod sse;
pub mod state;

// Re-export main types for convenience
pub use ai::{ChatProvider, CompletionRequest, Fragment, FragmentStream, MistralClient};
pub use client::RelayClient;
pub use config::Config;
pub use conversation::{Conversation, MessageId, Phase, ReplyEvent, SubmitError, Submission};
pub use error::{ProviderError, RelayError};
pub use state::{ChatMessage, ChatRole};
