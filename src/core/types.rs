//! Shared types used across Parley modules
//!
//! Contains the provider-neutral conversation turns, tool descriptors and
//! tool-host payloads.

use serde::{Deserialize, Serialize};

/// Role of a turn in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Result of a tool execution
    Tool,
}

impl Role {
    /// Parse a role name as reported by a prompt catalog
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" | "model" => Some(Role::Assistant),
            "tool" => Some(Role::Tool),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    /// Call identifier echoed back with the result
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// Arguments exactly as the model produced them
    pub arguments: serde_json::Value,
}

impl ToolCallRequest {
    /// Create a new tool call request
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }

    /// Arguments as a JSON object, parsing string payloads when possible
    pub fn arguments_object(&self) -> serde_json::Value {
        match &self.arguments {
            serde_json::Value::String(raw) => serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::json!({ "text": raw })),
            serde_json::Value::Null => serde_json::json!({}),
            other => other.clone(),
        }
    }

    /// Arguments as the string form OpenAI expects on echo-back
    pub fn arguments_string(&self) -> String {
        match &self.arguments {
            serde_json::Value::String(raw) => raw.clone(),
            other => other.to_string(),
        }
    }
}

/// One block of a structured turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text { text: String },
    ToolUse(ToolCallRequest),
}

/// Content carried by a turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    /// Plain text
    Text(String),
    /// Ordered text and tool-use blocks
    Blocks(Vec<ContentBlock>),
    /// Output of a tool, tagged with the call that produced it
    ToolResult {
        call_id: String,
        tool_name: String,
        output: String,
    },
}

/// A role-tagged unit of conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    /// Create a text turn with any role
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: TurnContent::Text(text.into()),
        }
    }

    /// Create a new system turn
    pub fn system(text: impl Into<String>) -> Self {
        Self::text(Role::System, text)
    }

    /// Create a new user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self::text(Role::User, text)
    }

    /// Create a new assistant text turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::text(Role::Assistant, text)
    }

    /// Create an assistant turn carrying tool intents after any leading text
    pub fn assistant_tool_use(text: &str, calls: &[ToolCallRequest]) -> Self {
        let mut blocks = Vec::with_capacity(calls.len() + 1);
        if !text.is_empty() {
            blocks.push(ContentBlock::Text {
                text: text.to_string(),
            });
        }
        blocks.extend(calls.iter().cloned().map(ContentBlock::ToolUse));

        Self {
            role: Role::Assistant,
            content: TurnContent::Blocks(blocks),
        }
    }

    /// Create a tool result turn
    pub fn tool_result(call: &ToolCallRequest, output: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: TurnContent::ToolResult {
                call_id: call.id.clone(),
                tool_name: call.name.clone(),
                output: output.into(),
            },
        }
    }

    /// Concatenated text of the turn, ignoring tool-use blocks
    pub fn text_content(&self) -> String {
        match &self.content {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::Text { text } => Some(text.as_str()),
                    ContentBlock::ToolUse(_) => None,
                })
                .collect::<Vec<_>>()
                .join(""),
            TurnContent::ToolResult { output, .. } => output.clone(),
        }
    }

    /// Call id of a tool result turn
    pub fn result_call_id(&self) -> Option<&str> {
        match &self.content {
            TurnContent::ToolResult { call_id, .. } => Some(call_id),
            _ => None,
        }
    }

    /// A tool result as plain text, for results whose intent is no longer
    /// part of the history (folded into a summary)
    pub fn result_as_text(&self) -> Option<String> {
        match &self.content {
            TurnContent::ToolResult {
                tool_name, output, ..
            } => Some(format!("Result of tool {}: {}", tool_name, output)),
            _ => None,
        }
    }

    /// Tool intents carried by the turn
    pub fn tool_calls(&self) -> Vec<&ToolCallRequest> {
        match &self.content {
            TurnContent::Blocks(blocks) => blocks
                .iter()
                .filter_map(|b| match b {
                    ContentBlock::ToolUse(call) => Some(call),
                    ContentBlock::Text { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Definition of a tool discovered on the tool host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Name of the tool
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: Option<String>,
    /// JSON Schema for the arguments
    #[serde(default, rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

impl ToolDescriptor {
    /// Create a new tool descriptor
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }

    /// Input schema, defaulting to an empty object schema
    pub fn schema_or_empty(&self) -> serde_json::Value {
        if self.input_schema.is_null() {
            serde_json::json!({ "type": "object", "properties": {} })
        } else {
            self.input_schema.clone()
        }
    }

    /// Description, empty when the host gave none
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// Entry of the tool host's prompt catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A message produced by expanding a catalog prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub text: String,
}

/// One piece of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolContent {
    Text { text: String },
    Other(serde_json::Value),
}

/// Result of a tool call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: Vec<ToolContent>,
}

impl ToolOutput {
    /// Create an output holding a single text item
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
        }
    }

    /// All text items joined by newlines; non-text items are rendered as JSON
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                ToolContent::Text { text } => text.clone(),
                ToolContent::Other(value) => value.to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assistant_tool_use_keeps_order() {
        let calls = vec![
            ToolCallRequest::new("1", "first", serde_json::json!({})),
            ToolCallRequest::new("2", "second", serde_json::json!({})),
        ];
        let turn = Turn::assistant_tool_use("thinking", &calls);

        let names: Vec<_> = turn.tool_calls().iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["first", "second"]);
        assert_eq!(turn.text_content(), "thinking");
    }

    #[test]
    fn test_arguments_object_from_string() {
        let call = ToolCallRequest::new("1", "t", serde_json::json!("{\"a\":1}"));
        assert_eq!(call.arguments_object(), serde_json::json!({"a": 1}));
        assert_eq!(call.arguments_string(), "{\"a\":1}");
    }

    #[test]
    fn test_tool_descriptor_deserializes_input_schema() {
        let tool: ToolDescriptor = serde_json::from_value(serde_json::json!({
            "name": "echo",
            "inputSchema": {"type": "object"}
        }))
        .unwrap();
        assert_eq!(tool.description_or_empty(), "");
        assert_eq!(tool.input_schema["type"], "object");
    }

    #[test]
    fn test_tool_output_joined_text() {
        let output = ToolOutput {
            content: vec![
                ToolContent::Text { text: "a".into() },
                ToolContent::Text { text: "b".into() },
            ],
        };
        assert_eq!(output.joined_text(), "a\nb");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("USER"), Some(Role::User));
        assert_eq!(Role::parse("model"), Some(Role::Assistant));
        assert_eq!(Role::parse("narrator"), None);
    }
}
