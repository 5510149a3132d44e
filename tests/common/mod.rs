//! Shared fakes for integration tests
//!
//! A scripted model endpoint, a scriptable tool host and a printer that
//! records everything it is asked to show.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use parley::core::{
    PromptInfo, PromptMessage, ProviderError, Role, ToolDescriptor, ToolHostError, ToolOutput,
};
use parley::llm::ChatTransport;
use parley::tools::HostResult;
use parley::{ModelBuilder, Printer, ToolHost};

/// Model endpoint that replays canned responses and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<Value, ProviderError>>>,
    requests: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Result<Value, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn send(&self, body: &Value) -> Result<Value, ProviderError> {
        self.requests.lock().unwrap().push(body.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
    }
}

/// Tool host with a fixed catalog and scripted call results
#[derive(Default)]
pub struct FakeHost {
    pub tools: Vec<ToolDescriptor>,
    pub prompts: Vec<PromptInfo>,
    pub prompt_messages: HashMap<String, Vec<PromptMessage>>,
    pub results: Mutex<VecDeque<HostResult<ToolOutput>>>,
    /// Every call fails with a protocol error once the script runs out
    pub always_protocol_error: bool,
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl FakeHost {
    pub fn with_results(results: Vec<HostResult<ToolOutput>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ToolHost for FakeHost {
    async fn list_tools(&self) -> HostResult<Vec<ToolDescriptor>> {
        Ok(self.tools.clone())
    }

    async fn list_prompts(&self) -> HostResult<Vec<PromptInfo>> {
        Ok(self.prompts.clone())
    }

    async fn get_prompt(&self, name: &str) -> HostResult<Vec<PromptMessage>> {
        self.prompt_messages
            .get(name)
            .cloned()
            .ok_or_else(|| ToolHostError::protocol(format!("Unknown prompt: {}", name)))
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> HostResult<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), arguments));

        if let Some(result) = self.results.lock().unwrap().pop_front() {
            return result;
        }
        if self.always_protocol_error {
            return Err(ToolHostError::protocol("connection reset"));
        }
        Ok(ToolOutput::text(format!("{} done", name)))
    }
}

/// Printer that keeps every line
#[derive(Default)]
pub struct RecordingPrinter {
    pub assistant: Mutex<Vec<String>>,
    pub system: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl RecordingPrinter {
    pub fn assistant_lines(&self) -> Vec<String> {
        self.assistant.lock().unwrap().clone()
    }

    pub fn system_lines(&self) -> Vec<String> {
        self.system.lock().unwrap().clone()
    }

    pub fn error_lines(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

impl Printer for RecordingPrinter {
    fn assistant(&self, text: &str) {
        self.assistant.lock().unwrap().push(text.to_string());
    }

    fn system(&self, text: &str) {
        self.system.lock().unwrap().push(text.to_string());
    }

    fn error(&self, text: &str) {
        self.errors.lock().unwrap().push(text.to_string());
    }
}

/// OpenAI builder wired to the fakes, with no waits and no summarizer
pub fn openai_builder(
    transport: &Arc<ScriptedTransport>,
    printer: &Arc<RecordingPrinter>,
) -> ModelBuilder {
    ModelBuilder::new()
        .openai_url("http://model.test/v1")
        .name("test-model")
        .max_tokens(1000)
        .temperature(0.0)
        .system_prompt("You are terse.")
        .max_tries(3)
        .wait_seconds(0)
        .disable_summarizer()
        .printer(printer.clone())
        .transport(transport.clone())
}

pub fn openai_text(text: &str) -> Result<Value, ProviderError> {
    Ok(json!({
        "choices": [{
            "finish_reason": "stop",
            "message": {"role": "assistant", "content": text}
        }]
    }))
}

/// `(id, name, arguments)` triples, arguments as the raw JSON string
pub fn openai_tool_calls(calls: &[(&str, &str, &str)]) -> Result<Value, ProviderError> {
    let calls: Vec<Value> = calls
        .iter()
        .map(|(id, name, args)| {
            json!({"id": id, "type": "function", "function": {"name": name, "arguments": args}})
        })
        .collect();
    Ok(json!({
        "choices": [{
            "finish_reason": "tool_calls",
            "message": {"role": "assistant", "content": null, "tool_calls": calls}
        }]
    }))
}

pub fn api_error(status: u16, message: &str) -> Result<Value, ProviderError> {
    Err(ProviderError::Api {
        status,
        message: message.to_string(),
        body: None,
    })
}

pub fn prompt(role: Role, text: &str) -> PromptMessage {
    PromptMessage {
        role,
        text: text.to_string(),
    }
}
