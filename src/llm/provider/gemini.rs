//! Google Gemini generateContent codec
//!
//! Gemini knows two roles, `user` and `model`. There is no discrete
//! stop/tool-call marker on the turn: the candidate carries a
//! `finishReason` and any `functionCall` parts are the intents. A
//! `CALL_FUNCTION` finish with no `functionCall` part is rejected.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::core::{
    ParleyError, ProviderError, ProviderKind, Result, Role, ToolCallRequest, ToolDescriptor, Turn,
    TurnContent,
};
use crate::llm::traits::{
    ErrorClass, ModelReply, RequestParts, SummaryParts, ToolCodec, TurnCodec,
};

/// Finish reason reported when the model stops to call a function
pub const CALL_FUNCTION: &str = "CALL_FUNCTION";

/// Schema keywords the function declaration endpoint rejects
const UNSUPPORTED_SCHEMA_KEYS: &[&str] = &["$schema", "additionalProperties"];

/// Codec for the Gemini generateContent API
#[derive(Debug, Clone, Default)]
pub struct GeminiCodec;

impl GeminiCodec {
    pub fn new() -> Self {
        Self
    }

    fn encode_turns(turns: &[Turn]) -> Vec<Value> {
        let mut contents: Vec<Value> = Vec::new();
        let mut issued: HashSet<&str> = HashSet::new();

        for turn in turns {
            issued.extend(turn.tool_calls().into_iter().map(|c| c.id.as_str()));

            match (&turn.role, &turn.content) {
                // A functionResponse must answer a functionCall
                (_, TurnContent::ToolResult { call_id, .. })
                    if !issued.contains(call_id.as_str()) =>
                {
                    let text = turn.result_as_text().unwrap_or_default();
                    push_part(&mut contents, "user", json!({ "text": text }), "text");
                }
                (_, TurnContent::ToolResult {
                    tool_name, output, ..
                }) => {
                    let part = json!({
                        "functionResponse": {
                            "name": tool_name,
                            "response": { "content": output },
                        }
                    });
                    push_part(&mut contents, "user", part, "functionResponse");
                }
                (Role::Assistant, _) => {
                    let mut parts = Vec::new();
                    let text = turn.text_content();
                    if !text.is_empty() {
                        parts.push(json!({ "text": text }));
                    }
                    for call in turn.tool_calls() {
                        parts.push(json!({
                            "functionCall": {
                                "name": call.name,
                                "args": call.arguments_object(),
                            }
                        }));
                    }
                    if !parts.is_empty() {
                        contents.push(json!({ "role": "model", "parts": parts }));
                    }
                }
                // No system role: instructions ride along as user text
                (Role::System | Role::User | Role::Tool, _) => {
                    let text = turn.text_content();
                    if !text.is_empty() {
                        push_part(&mut contents, "user", json!({ "text": text }), "text");
                    }
                }
            }
        }

        contents
    }

    fn first_candidate(body: &Value) -> Result<&Value> {
        body.get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .ok_or_else(|| ParleyError::invalid_response("No candidates in Gemini response"))
    }

    fn parts(candidate: &Value) -> &[Value] {
        candidate
            .pointer("/content/parts")
            .and_then(|p| p.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Append `part` to the last content when it has the same role and only
/// holds parts of the same kind; otherwise open a new content.
fn push_part(contents: &mut Vec<Value>, role: &str, part: Value, kind: &str) {
    if let Some(parts) = contents
        .last_mut()
        .filter(|c| c["role"] == role)
        .and_then(|c| c["parts"].as_array_mut())
        .filter(|p| p.iter().all(|x| x.get(kind).is_some()))
    {
        parts.push(part);
        return;
    }
    contents.push(json!({ "role": role, "parts": [part] }));
}

/// Drop schema keywords Gemini does not accept, recursively
fn sanitize_schema(schema: Value) -> Value {
    match schema {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(k, _)| !UNSUPPORTED_SCHEMA_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k, sanitize_schema(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_schema).collect()),
        other => other,
    }
}

impl ToolCodec for GeminiCodec {
    fn declare_tools(&self, tools: &[ToolDescriptor]) -> Value {
        if tools.is_empty() {
            return json!([]);
        }

        let declarations: Vec<Value> = tools
            .iter()
            .map(|tool| {
                json!({
                    "name": tool.name,
                    "description": tool.description_or_empty(),
                    "parameters": sanitize_schema(tool.schema_or_empty()),
                })
            })
            .collect();

        json!([{ "function_declarations": declarations }])
    }
}

impl TurnCodec for GeminiCodec {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn display_name(&self) -> &'static str {
        "Gemini"
    }

    fn build_request(&self, parts: RequestParts<'_>) -> Value {
        let mut body = json!({
            "contents": Self::encode_turns(parts.turns),
            "generationConfig": {
                "temperature": parts.temperature,
                "maxOutputTokens": parts.max_tokens,
            },
        });

        if let Some(tools) = parts.tools.filter(|t| t.as_array().is_some_and(|a| !a.is_empty())) {
            body["tools"] = tools.clone();
        }

        body
    }

    fn parse_response(&self, body: &Value) -> Result<ModelReply> {
        let candidate = Self::first_candidate(body)?;
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for part in Self::parts(candidate) {
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                text.push_str(t);
            }
            if let Some(call) = part.get("functionCall") {
                let name = call
                    .get("name")
                    .and_then(|n| n.as_str())
                    .ok_or_else(|| ParleyError::invalid_response("functionCall without name"))?;
                let id = call
                    .get("id")
                    .and_then(|i| i.as_str())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("call_{}", tool_calls.len()));
                tool_calls.push(ToolCallRequest::new(
                    id,
                    name,
                    call.get("args").cloned().unwrap_or(Value::Null),
                ));
            }
        }

        let finish_reason = candidate
            .get("finishReason")
            .and_then(|f| f.as_str())
            .map(str::to_string);
        if finish_reason.as_deref() == Some(CALL_FUNCTION) && tool_calls.is_empty() {
            return Err(ParleyError::invalid_response(
                "Gemini finished with CALL_FUNCTION but sent no functionCall",
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
            "contents": [{
                "role": "user",
                "parts": [
                    { "text": parts.system_prompt },
                    { "text": parts.user_prompt },
                ],
            }],
            "generationConfig": {
                "temperature": parts.temperature,
                "maxOutputTokens": parts.max_tokens,
            },
        })
    }

    fn parse_summary(&self, body: &Value) -> Result<String> {
        let text: String = Self::parts(Self::first_candidate(body)?)
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();

        if text.is_empty() {
            return Err(ParleyError::invalid_response(
                "No summary text in Gemini response",
            ));
        }
        Ok(text)
    }

    fn classify_error(&self, error: &ProviderError) -> ErrorClass {
        let message = error.message().to_ascii_lowercase();
        if error.error_status() == Some("RESOURCE_EXHAUSTED") || message.contains("quota") {
            ErrorClass::QuotaExhausted
        } else if message.contains("overloaded") {
            ErrorClass::Overloaded
        } else if error.status() == Some(429) {
            ErrorClass::RateLimited
        } else {
            ErrorClass::Unknown
        }
    }
}
