//! LLM module - Language Model integrations
//!
//! Provider codecs for OpenAI, Anthropic and Gemini, the HTTP transport,
//! retry policy and the builder that assembles a conversation model.

pub mod builder;
pub mod provider;
pub mod retry;
pub mod traits;
pub mod transport;

pub use builder::ModelBuilder;
pub use provider::{codec_for, AnthropicCodec, GeminiCodec, OpenAiCodec};
pub use retry::{cancellable_wait, RetryPolicy, MAX_ATTEMPTS_MESSAGE};
pub use traits::{
    ChatTransport, ErrorClass, ModelReply, ProviderCodec, RequestParts, SummaryParts, ToolCodec,
    TurnCodec,
};
pub use transport::HttpTransport;
