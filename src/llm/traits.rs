//! Provider seams
//!
//! A provider is split in two: a codec that knows the vendor's JSON shapes
//! and a transport that moves JSON to the endpoint and back. The
//! conversation loop itself is shared by every provider.

use async_trait::async_trait;

use crate::core::{ProviderError, ProviderKind, Result, ToolCallRequest, ToolDescriptor, Turn};

/// Parsed model response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelReply {
    /// Text content of the response
    pub text: String,
    /// Tool intents, in the order the model returned them
    pub tool_calls: Vec<ToolCallRequest>,
    /// Vendor finish reason, when reported
    pub finish_reason: Option<String>,
}

impl ModelReply {
    /// Create a terminal text reply
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// True when the model asked for at least one tool
    pub fn wants_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Inputs to one model request
#[derive(Debug, Clone, Copy)]
pub struct RequestParts<'a> {
    pub model: &'a str,
    pub turns: &'a [Turn],
    /// Tool declarations, already in the provider's shape
    pub tools: Option<&'a serde_json::Value>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Inputs to the summarization side request
#[derive(Debug, Clone, Copy)]
pub struct SummaryParts<'a> {
    pub model: &'a str,
    pub system_prompt: &'a str,
    /// User prompt prefix followed by the stringified history
    pub user_prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Transient conditions recognized in provider error payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    RateLimited,
    Overloaded,
    QuotaExhausted,
    Unknown,
}

/// Translates tool descriptors into a provider's declaration format
pub trait ToolCodec: Send + Sync {
    fn declare_tools(&self, tools: &[ToolDescriptor]) -> serde_json::Value;
}

/// Encodes history into a provider's request and decodes its responses
pub trait TurnCodec: Send + Sync {
    /// Provider family
    fn kind(&self) -> ProviderKind;

    /// Human-readable vendor name used in diagnostics
    fn display_name(&self) -> &'static str;

    /// Full request body for the conversation
    fn build_request(&self, parts: RequestParts<'_>) -> serde_json::Value;

    /// Split a response body into text and tool intents
    fn parse_response(&self, body: &serde_json::Value) -> Result<ModelReply>;

    /// Request body for the summarization side call
    fn summary_request(&self, parts: SummaryParts<'_>) -> serde_json::Value;

    /// Summary text from a summarization response
    fn parse_summary(&self, body: &serde_json::Value) -> Result<String>;

    /// Recognize transient conditions in an error payload
    fn classify_error(&self, error: &ProviderError) -> ErrorClass;
}

/// Everything the conversation loop needs from one provider
pub trait ProviderCodec: TurnCodec + ToolCodec {}

impl<T: TurnCodec + ToolCodec> ProviderCodec for T {}

/// Moves request bodies to a model endpoint
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, body: &serde_json::Value)
        -> std::result::Result<serde_json::Value, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_wants_tools() {
        assert!(!ModelReply::text("done").wants_tools());

        let reply = ModelReply {
            tool_calls: vec![ToolCallRequest::new("1", "t", serde_json::json!({}))],
            ..Default::default()
        };
        assert!(reply.wants_tools());
    }

    #[test]
    fn test_transport_is_object_safe() {
        fn _assert_object_safe(_: &dyn ChatTransport) {}
        fn _assert_codec_object_safe(_: &dyn ProviderCodec) {}
    }
}
