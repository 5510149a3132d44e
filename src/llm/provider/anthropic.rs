//! Anthropic messages codec
//!
//! Assistant turns are ordered lists of typed blocks (`text`, `tool_use`).
//! Tool results travel back inside `user` messages as `tool_result` blocks
//! that reference the originating `tool_use` id. The messages array has no
//! system role, so system turns are lifted into the top-level `system` field.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::core::{
    ParleyError, ProviderError, ProviderKind, Result, Role, ToolCallRequest, ToolDescriptor, Turn,
    TurnContent,
};
use crate::llm::traits::{
    ErrorClass, ModelReply, RequestParts, SummaryParts, ToolCodec, TurnCodec,
};

const CREDIT_BALANCE_MESSAGE: &str = "Your credit balance is too low to access the Anthropic API. Please go to Plans & Billing to upgrade or purchase credits.";
const OVERLOADED_MESSAGE: &str = "Overloaded";
const RATE_LIMIT_PREFIX: &str = "This request would exceed your organization's";

/// Codec for the Anthropic messages API
#[derive(Debug, Clone, Default)]
pub struct AnthropicCodec;

impl AnthropicCodec {
    pub fn new() -> Self {
        Self
    }

    /// Split turns into the system string and the messages array.
    ///
    /// A `tool_result` must follow its `tool_use`; results whose intent is
    /// not in the encoded history are sent as plain user text.
    fn encode_turns(turns: &[Turn]) -> (String, Vec<Value>) {
        let mut system = Vec::new();
        let mut messages: Vec<Value> = Vec::new();
        let mut issued: HashSet<&str> = HashSet::new();

        for turn in turns {
            issued.extend(turn.tool_calls().into_iter().map(|c| c.id.as_str()));

            match (&turn.role, &turn.content) {
                (_, TurnContent::ToolResult { call_id, .. })
                    if !issued.contains(call_id.as_str()) =>
                {
                    let text = turn.result_as_text().unwrap_or_default();
                    messages.push(json!({ "role": "user", "content": text }));
                }
                (_, TurnContent::ToolResult {
                    call_id, output, ..
                }) => {
                    let block = json!({
                        "type": "tool_result",
                        "tool_use_id": call_id,
                        "content": output,
                    });
                    // Results of one assistant turn share a single user message
                    if let Some(blocks) = messages
                        .last_mut()
                        .filter(|m| m["role"] == "user")
                        .and_then(|m| m["content"].as_array_mut())
                        .filter(|b| b.iter().all(|x| x["type"] == "tool_result"))
                    {
                        blocks.push(block);
                    } else {
                        messages.push(json!({ "role": "user", "content": [block] }));
                    }
                }
                (Role::System, _) => system.push(turn.text_content()),
                (Role::Assistant, _) => {
                    let mut blocks = Vec::new();
                    let text = turn.text_content();
                    if !text.is_empty() {
                        blocks.push(json!({ "type": "text", "text": text }));
                    }
                    for call in turn.tool_calls() {
                        blocks.push(json!({
                            "type": "tool_use",
                            "id": call.id,
                            "name": call.name,
                            "input": call.arguments_object(),
                        }));
                    }
                    if !blocks.is_empty() {
                        messages.push(json!({ "role": "assistant", "content": blocks }));
                    }
                }
                (Role::User | Role::Tool, _) => {
                    messages.push(json!({ "role": "user", "content": turn.text_content() }));
                }
            }
        }

        let system = system
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        (system, messages)
    }

    fn content_blocks(body: &Value) -> Result<&Vec<Value>> {
        body.get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| ParleyError::invalid_response("No content array in Anthropic response"))
    }
}

impl ToolCodec for AnthropicCodec {
    fn declare_tools(&self, tools: &[ToolDescriptor]) -> Value {
        Value::Array(
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "name": tool.name,
                        "description": tool.description_or_empty(),
                        "input_schema": tool.schema_or_empty(),
                    })
                })
                .collect(),
        )
    }
}

impl TurnCodec for AnthropicCodec {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    fn display_name(&self) -> &'static str {
        "Anthropic"
    }

    fn build_request(&self, parts: RequestParts<'_>) -> Value {
        let (system, messages) = Self::encode_turns(parts.turns);

        let mut body = json!({
            "model": parts.model,
            "max_tokens": parts.max_tokens,
            "temperature": parts.temperature,
            "messages": messages,
        });

        if !system.is_empty() {
            body["system"] = Value::String(system);
        }

        if let Some(tools) = parts.tools.filter(|t| t.as_array().is_some_and(|a| !a.is_empty())) {
            body["tools"] = tools.clone();
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<ModelReply> {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in Self::content_blocks(body)? {
            match block.get("type").and_then(|t| t.as_str()) {
                Some("text") => {
                    if let Some(t) = block.get("text").and_then(|t| t.as_str()) {
                        text.push_str(t);
                    }
                }
                Some("tool_use") => {
                    let name = block
                        .get("name")
                        .and_then(|n| n.as_str())
                        .ok_or_else(|| ParleyError::invalid_response("tool_use block without name"))?;
                    tool_calls.push(ToolCallRequest::new(
                        block.get("id").and_then(|i| i.as_str()).unwrap_or_default(),
                        name,
                        block.get("input").cloned().unwrap_or(Value::Null),
                    ));
                }
                _ => {}
            }
        }

        Ok(ModelReply {
            text,
            tool_calls,
            finish_reason: body
                .get("stop_reason")
                .and_then(|s| s.as_str())
                .map(str::to_string),
        })
    }

    fn summary_request(&self, parts: SummaryParts<'_>) -> Value {
        json!({
            "model": parts.model,
            "max_tokens": parts.max_tokens,
            "temperature": parts.temperature,
            "system": parts.system_prompt,
            "messages": [{ "role": "user", "content": parts.user_prompt }],
        })
    }

    fn parse_summary(&self, body: &Value) -> Result<String> {
        let text: String = Self::content_blocks(body)?
            .iter()
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            return Err(ParleyError::invalid_response(
                "No summary text in Anthropic response",
            ));
        }
        Ok(text)
    }

    fn classify_error(&self, error: &ProviderError) -> ErrorClass {
        let message = error.message();
        if message == CREDIT_BALANCE_MESSAGE {
            ErrorClass::QuotaExhausted
        } else if message == OVERLOADED_MESSAGE {
            ErrorClass::Overloaded
        } else if message.starts_with(RATE_LIMIT_PREFIX) {
            ErrorClass::RateLimited
        } else {
            ErrorClass::Unknown
        }
    }
}
