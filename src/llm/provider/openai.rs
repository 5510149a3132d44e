//! OpenAI chat completions codec
//!
//! Turns are flat `{role, content}` objects. Tool intents ride on the
//! assistant message as `tool_calls` and results come back under the
//! dedicated `tool` role.

use std::collections::HashSet;

use serde_json::{json, Value};

use crate::core::{
    ParleyError, ProviderError, ProviderKind, Result, Role, ToolCallRequest, ToolDescriptor, Turn,
    TurnContent,
};
use crate::llm::traits::{
    ErrorClass, ModelReply, RequestParts, SummaryParts, ToolCodec, TurnCodec,
};

/// Finish reason of a response that asks for tools
const TOOL_CALLS_FINISH: &str = "tool_calls";

/// Codec for OpenAI and OpenAI-compatible servers
#[derive(Debug, Clone, Default)]
pub struct OpenAiCodec;

impl OpenAiCodec {
    pub fn new() -> Self {
        Self
    }

    /// Convert one turn to an OpenAI message
    fn encode_turn(turn: &Turn) -> Value {
        match (&turn.role, &turn.content) {
            (_, TurnContent::ToolResult {
                call_id,
                tool_name,
                output,
            }) => json!({
                "role": "tool",
                "tool_call_id": call_id,
                "name": tool_name,
                "content": output,
            }),
            (Role::Assistant, TurnContent::Blocks(_)) => {
                let calls: Vec<Value> = turn
                    .tool_calls()
                    .into_iter()
                    .map(|call| {
                        json!({
                            "id": call.id,
                            "type": "function",
                            "function": {
                                "name": call.name,
                                "arguments": call.arguments_string(),
                            }
                        })
                    })
                    .collect();

                let text = turn.text_content();
                let mut message = json!({
                    "role": "assistant",
                    "content": if text.is_empty() { Value::Null } else { Value::String(text) },
                });
                if !calls.is_empty() {
                    message["tool_calls"] = Value::Array(calls);
                }
                message
            }
            (role, _) => {
                let role = match role {
                    Role::System => "system",
                    Role::Assistant => "assistant",
                    Role::User | Role::Tool => "user",
                };
                json!({ "role": role, "content": turn.text_content() })
            }
        }
    }

    /// Encode the history. A result whose intent is not in the encoded
    /// history is sent as user text: the `tool` role must answer a call.
    fn encode_turns(turns: &[Turn]) -> Vec<Value> {
        let mut issued: HashSet<&str> = HashSet::new();

        turns
            .iter()
            .map(|turn| {
                issued.extend(turn.tool_calls().into_iter().map(|c| c.id.as_str()));
                match (turn.result_call_id(), turn.result_as_text()) {
                    (Some(id), Some(text)) if !issued.contains(id) => {
                        json!({ "role": "user", "content": text })
                    }
                    _ => Self::encode_turn(turn),
                }
            })
            .collect()
    }

    fn parse_tool_call(call: &Value) -> Result<ToolCallRequest> {
        let function = call
            .get("function")
            .ok_or_else(|| ParleyError::invalid_response("tool call without function"))?;
        let name = function
            .get("name")
            .and_then(|n| n.as_str())
            .ok_or_else(|| ParleyError::invalid_response("tool call without function name"))?;

        Ok(ToolCallRequest::new(
            call.get("id").and_then(|i| i.as_str()).unwrap_or_default(),
            name,
            function.get("arguments").cloned().unwrap_or(Value::Null),
        ))
    }

    fn first_choice(body: &Value) -> Result<&Value> {
        body.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| ParleyError::invalid_response("No choices in OpenAI response"))
    }
}

impl ToolCodec for OpenAiCodec {
    fn declare_tools(&self, tools: &[ToolDescriptor]) -> Value {
        Value::Array(
            tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description_or_empty(),
                            "parameters": tool.schema_or_empty(),
                        }
                    })
                })
                .collect(),
        )
    }
}

impl TurnCodec for OpenAiCodec {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn display_name(&self) -> &'static str {
        "OpenAI"
    }

    fn build_request(&self, parts: RequestParts<'_>) -> Value {
        let messages = Self::encode_turns(parts.turns);

        let mut body = json!({
            "model": parts.model,
            "messages": messages,
            "max_tokens": parts.max_tokens,
            "temperature": parts.temperature,
        });

        if let Some(tools) = parts.tools.filter(|t| t.as_array().is_some_and(|a| !a.is_empty())) {
            body["tools"] = tools.clone();
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<ModelReply> {
        let choice = Self::first_choice(body)?;
        let message = choice
            .get("message")
            .ok_or_else(|| ParleyError::invalid_response("No message in OpenAI choice"))?;

        let text = message
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default()
            .to_string();

        let tool_calls = message
            .get("tool_calls")
            .and_then(|c| c.as_array())
            .map(|calls| calls.iter().map(Self::parse_tool_call).collect::<Result<Vec<_>>>())
            .transpose()?
            .unwrap_or_default();

        let finish_reason = choice
            .get("finish_reason")
            .and_then(|f| f.as_str())
            .map(str::to_string);
        if finish_reason.as_deref() == Some(TOOL_CALLS_FINISH) && tool_calls.is_empty() {
            return Err(ParleyError::invalid_response(
                "OpenAI finished with tool_calls but sent none",
            ));
        }

        Ok(ModelReply {
            text,
            tool_calls,
            finish_reason,
        })
    }

    fn summary_request(&self, parts: SummaryParts<'_>) -> Value {
        json!({
            "model": parts.model,
            "messages": [
                { "role": "system", "content": parts.system_prompt },
                { "role": "user", "content": parts.user_prompt },
            ],
            "max_tokens": parts.max_tokens,
            "temperature": parts.temperature,
        })
    }

    fn parse_summary(&self, body: &Value) -> Result<String> {
        Self::first_choice(body)?
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| ParleyError::invalid_response("No summary text in OpenAI response"))
    }

    fn classify_error(&self, error: &ProviderError) -> ErrorClass {
        let message = error.message();
        if message.contains("You exceeded your current quota") {
            ErrorClass::QuotaExhausted
        } else if message.contains("Rate limit reached") {
            ErrorClass::RateLimited
        } else if message.to_ascii_lowercase().contains("overloaded") {
            ErrorClass::Overloaded
        } else {
            ErrorClass::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts<'a>(turns: &'a [Turn], tools: Option<&'a Value>) -> RequestParts<'a> {
        RequestParts {
            model: "gpt-test",
            turns,
            tools,
            max_tokens: 256,
            temperature: 0.1,
        }
    }

    #[test]
    fn test_declare_tools_defaults_schema() {
        let tools = OpenAiCodec.declare_tools(&[ToolDescriptor {
            name: "ping".into(),
            description: None,
            input_schema: Value::Null,
        }]);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "ping");
        assert_eq!(tools[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn test_request_echoes_tool_cycle() {
        let call = ToolCallRequest::new("call_1", "search", json!("{\"q\":\"rust\"}"));
        let turns = vec![
            Turn::system("be brief"),
            Turn::user("find rust"),
            Turn::assistant_tool_use("", std::slice::from_ref(&call)),
            Turn::tool_result(&call, "found"),
        ];
        let body = OpenAiCodec.build_request(parts(&turns, None));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[2]["content"], Value::Null);
        assert_eq!(messages[2]["tool_calls"][0]["function"]["arguments"], "{\"q\":\"rust\"}");
        assert_eq!(messages[3]["role"], "tool");
        assert_eq!(messages[3]["tool_call_id"], "call_1");
        assert!(body.get("tools").is_none());
    }

    #[test]
    fn test_parse_tool_calls() {
        let body = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "one", "arguments": "{}"}},
                        {"id": "b", "type": "function", "function": {"name": "two", "arguments": "{\"x\":1}"}}
                    ]
                }
            }]
        });
        let reply = OpenAiCodec.parse_response(&body).unwrap();
        assert_eq!(reply.tool_calls.len(), 2);
        assert_eq!(reply.tool_calls[1].name, "two");
        assert_eq!(reply.finish_reason.as_deref(), Some("tool_calls"));
    }

    #[test]
    fn test_parse_stop() {
        let body = json!({
            "choices": [{"finish_reason": "stop", "message": {"role": "assistant", "content": "hi"}}]
        });
        let reply = OpenAiCodec.parse_response(&body).unwrap();
        assert_eq!(reply.text, "hi");
        assert!(!reply.wants_tools());
    }

    #[test]
    fn test_results_without_intent_become_user_text() {
        let a = ToolCallRequest::new("a", "one", json!({}));
        let b = ToolCallRequest::new("b", "two", json!({}));
        let turns = vec![
            Turn::system("be brief"),
            Turn::system("summary"),
            Turn::tool_result(&a, "r1"),
            Turn::tool_result(&b, "r2"),
        ];
        let body = OpenAiCodec.build_request(parts(&turns, None));

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert!(messages.iter().all(|m| m["role"] != "tool"));
        assert_eq!(messages[2]["role"], "user");
        assert_eq!(messages[2]["content"], "Result of tool one: r1");
        assert_eq!(messages[3]["content"], "Result of tool two: r2");
    }

    #[test]
    fn test_malformed_tool_call_is_rejected() {
        let body = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "tool_calls": [
                        {"id": "a", "type": "function", "function": {"name": "one", "arguments": "{}"}},
                        {"id": "b", "type": "function"}
                    ]
                }
            }]
        });
        assert!(matches!(
            OpenAiCodec.parse_response(&body),
            Err(ParleyError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_tool_calls_finish_without_calls_is_rejected() {
        let body = json!({
            "choices": [{
                "finish_reason": "tool_calls",
                "message": {"role": "assistant", "content": "", "tool_calls": []}
            }]
        });
        assert!(matches!(
            OpenAiCodec.parse_response(&body),
            Err(ParleyError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_parse_without_choices_fails() {
        assert!(OpenAiCodec.parse_response(&json!({})).is_err());
    }

    #[test]
    fn test_classify_errors() {
        let err = |m: &str| ProviderError::Api {
            status: 429,
            message: m.to_string(),
            body: None,
        };
        assert_eq!(
            OpenAiCodec.classify_error(&err("You exceeded your current quota, please check")),
            ErrorClass::QuotaExhausted
        );
        assert_eq!(
            OpenAiCodec.classify_error(&err("Rate limit reached for gpt-4o")),
            ErrorClass::RateLimited
        );
        assert_eq!(
            OpenAiCodec.classify_error(&err("something else")),
            ErrorClass::Unknown
        );
    }
}
