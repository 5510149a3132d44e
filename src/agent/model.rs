//! Conversation model
//!
//! [`ChatModel`] owns the history of one conversation and runs the
//! tool-calling loop: request, decode, execute every tool intent, append the
//! results, and request again until the model answers without tools.
//! Vendor differences live entirely in the injected [`ProviderCodec`].

use std::sync::Arc;

use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{TurnPhase, TurnState};
use crate::agent::tokens::TokenEstimator;
use crate::core::{
    ModelConfig, ParleyError, Printer, ProviderKind, Result, ToolCallRequest, ToolDescriptor,
    ToolHostError, Turn,
};
use crate::llm::retry::{cancellable_wait, RetryPolicy};
use crate::llm::{ChatTransport, ModelReply, ProviderCodec, RequestParts, SummaryParts};
use crate::tools::{normalize_args, ToolHost};

/// A configured conversation model
pub struct ChatModel {
    config: ModelConfig,
    codec: Box<dyn ProviderCodec>,
    transport: Arc<dyn ChatTransport>,
    printer: Arc<dyn Printer>,
    estimator: Box<dyn TokenEstimator>,
    tool_host: Option<Arc<dyn ToolHost>>,
    /// Tool declarations in the provider's shape
    tools: Option<Value>,
    conversation: Conversation,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl std::fmt::Debug for ChatModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatModel")
            .field("provider", &self.config.kind)
            .field("name", &self.config.name)
            .field("turns", &self.conversation.len())
            .finish_non_exhaustive()
    }
}

impl ChatModel {
    /// Assemble a model from its parts; [`crate::llm::ModelBuilder`] is the
    /// usual way in.
    pub fn new(
        config: ModelConfig,
        codec: Box<dyn ProviderCodec>,
        transport: Arc<dyn ChatTransport>,
        printer: Arc<dyn Printer>,
        estimator: Box<dyn TokenEstimator>,
    ) -> Self {
        let retry = RetryPolicy::new(config.max_tries, config.wait_seconds);
        let conversation = Conversation::new(config.system_prompt.clone());

        Self {
            config,
            codec,
            transport,
            printer,
            estimator,
            tool_host: None,
            tools: None,
            conversation,
            retry,
            cancel: CancellationToken::new(),
        }
    }

    /// Reset the history to the system turn
    pub fn initialize(&mut self) {
        let system = self.conversation.system();
        self.conversation = Conversation::new(system);
    }

    /// Replace the live system instruction
    pub fn set_system(&mut self, prompt: impl Into<String>) {
        self.conversation.set_system(prompt);
    }

    /// Current system instruction
    pub fn system(&self) -> String {
        self.conversation.system()
    }

    /// Declare tools for every later request; repeated calls overwrite
    pub fn register_tools(&mut self, tools: &[ToolDescriptor]) {
        debug!(count = tools.len(), "registering tools");
        self.tools = Some(self.codec.declare_tools(tools));
    }

    /// Tool declarations as sent to the provider
    pub fn declared_tools(&self) -> Option<&Value> {
        self.tools.as_ref()
    }

    /// Use `host` to execute tools and expand prompts
    pub fn attach_tool_host(&mut self, host: Arc<dyn ToolHost>) {
        self.tool_host = Some(host);
    }

    /// Append the query to the history.
    ///
    /// `/name ...` expands the host's `name` prompt into one turn per
    /// message; without a host, or when the catalog fails, the literal text
    /// is appended instead.
    pub async fn classify_and_append_query(&mut self, query: &str) {
        if let Some(turns) = self.expand_prompt(query).await {
            for turn in turns {
                self.conversation.push(turn);
            }
            return;
        }
        self.conversation.push(Turn::user(query));
    }

    async fn expand_prompt(&self, query: &str) -> Option<Vec<Turn>> {
        let name = query.strip_prefix('/')?.split_whitespace().next()?;
        let host = self.tool_host.as_ref()?;

        match host.get_prompt(name).await {
            Ok(messages) if !messages.is_empty() => Some(
                messages
                    .into_iter()
                    .map(|m| Turn::text(m.role, m.text))
                    .collect(),
            ),
            Ok(_) => None,
            Err(e) => {
                warn!(prompt = name, error = %e, "prompt expansion failed, sending literal text");
                None
            }
        }
    }

    /// True when history plus `pending` reaches the token budget.
    ///
    /// Always false without a summarizer.
    pub fn needs_summarization(&self, pending: &Turn) -> bool {
        if self.config.summarizer.is_none() {
            return false;
        }

        let mut snapshot = self.conversation.turns().to_vec();
        snapshot.push(pending.clone());
        let text = serde_json::to_string(&snapshot).unwrap_or_else(|_| format!("{:?}", snapshot));

        let tokens = self.estimator.count(&text);
        let needed = tokens >= self.config.max_tokens as usize;
        if needed {
            debug!(tokens, budget = self.config.max_tokens, "a summary is needed");
        }
        needed
    }

    /// Request body for the current history
    pub fn build_request(&self) -> Value {
        self.codec.build_request(RequestParts {
            model: &self.config.name,
            turns: self.conversation.turns(),
            tools: self.tools.as_ref(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }

    /// Send the current history, retrying transient failures.
    ///
    /// `Ok(None)` means every attempt failed; the failures were already
    /// reported through the printer.
    pub async fn create_message(&self) -> Result<Option<ModelReply>> {
        let body = self.build_request();
        let codec = self.codec.as_ref();
        let transport = self.transport.as_ref();

        let response = self
            .retry
            .run(
                codec.display_name(),
                |e| codec.classify_error(e),
                self.printer.as_ref(),
                &self.cancel,
                || transport.send(&body),
            )
            .await?;

        response
            .map(|body| codec.parse_response(&body))
            .transpose()
    }

    /// Run one user query to completion and return the final answer
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        self.classify_and_append_query(query).await;

        let pending = Turn::user(query);
        let mut state = TurnState::new();

        while state.should_continue() {
            if self.needs_summarization(&pending) {
                self.summarize_or_report().await?;
            }

            state.issue();
            let reply = self.create_message().await?.ok_or(ParleyError::NoResponse)?;
            state.respond();
            debug!(
                finish_reason = reply.finish_reason.as_deref().unwrap_or("-"),
                tool_calls = reply.tool_calls.len(),
                "model replied"
            );

            match state.receive(&reply) {
                TurnPhase::Complete => {
                    debug!(requests = state.requests, tool_calls = state.tool_calls, "turn complete");
                    self.conversation.push(Turn::assistant(reply.text.clone()));
                    self.printer.assistant(&reply.text);
                    return Ok(reply.text);
                }
                _ => self.run_tools(&reply).await?,
            }
        }

        Err(ParleyError::NoResponse)
    }

    /// Record the intents, then execute them in model order
    async fn run_tools(&mut self, reply: &ModelReply) -> Result<()> {
        if !reply.text.is_empty() {
            self.printer.assistant(&reply.text);
        }
        self.conversation
            .push(Turn::assistant_tool_use(&reply.text, &reply.tool_calls));

        for call in &reply.tool_calls {
            let output = self.execute_tool(call).await?;
            self.conversation.push(Turn::tool_result(call, output));
        }
        Ok(())
    }

    /// Call one tool, retrying protocol errors until success or cancellation
    async fn execute_tool(&self, call: &ToolCallRequest) -> Result<String> {
        let host = self
            .tool_host
            .as_ref()
            .ok_or_else(|| ToolHostError::Unavailable("no tool host attached".to_string()))?;
        let arguments = normalize_args(&call.arguments);

        loop {
            info!(tool = %call.name, "calling tool");
            match host.call_tool(&call.name, arguments.clone()).await {
                Ok(output) => return Ok(output.joined_text()),
                Err(ToolHostError::Protocol(message)) => {
                    warn!(tool = %call.name, error = %message, "tool call failed, retrying");
                    self.printer.error(&format!(
                        "{}; a new attempt will be made in {} seconds",
                        message,
                        self.retry.wait.as_secs()
                    ));
                    cancellable_wait(self.retry.wait, &self.cancel).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Compress everything between the system turn and the last two turns
    /// into a single summary turn.
    ///
    /// One attempt, no retry. Does nothing without a summarizer or when
    /// there is nothing to fold.
    pub async fn summarize(&mut self) -> Result<()> {
        let Some(summarizer) = self.config.summarizer.as_ref() else {
            return Ok(());
        };
        let slice = self.conversation.summarizable();
        if slice.is_empty() {
            return Ok(());
        }

        debug!(turns = slice.len(), "started summarization");
        let user_prompt = format!("{}{}", summarizer.user_prompt, serde_json::to_string(slice)?);
        let body = self.codec.summary_request(SummaryParts {
            model: &self.config.name,
            system_prompt: &summarizer.system_prompt,
            user_prompt: &user_prompt,
            max_tokens: summarizer.max_tokens,
            temperature: summarizer.temperature,
        });

        let response = tokio::select! {
            response = self.transport.send(&body) => response?,
            _ = self.cancel.cancelled() => return Err(ParleyError::Cancelled),
        };
        let summary = self.codec.parse_summary(&response)?;
        debug!(summary = %summary, "summary produced");

        self.conversation.compact(summary);
        debug!("finished summarization");
        Ok(())
    }

    /// Summarize, reporting failures instead of failing the turn
    async fn summarize_or_report(&mut self) -> Result<()> {
        match self.summarize().await {
            Err(ParleyError::Cancelled) => Err(ParleyError::Cancelled),
            Err(e) => {
                warn!(error = %e, "summarization failed, continuing with full history");
                self.printer.error(&format!("Summarization failed: {}", e));
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    /// The full history, system turn first
    pub fn messages(&self) -> &[Turn] {
        self.conversation.turns()
    }

    /// Replace the history with the system turn followed by `turns`
    pub fn set_messages(&mut self, turns: impl IntoIterator<Item = Turn>) {
        self.conversation.reset_to(turns);
    }

    /// Drop everything but the system turn
    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Token that interrupts backoff and tool-retry waits
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Replace a cancelled token so the next turn can run
    pub fn reset_cancellation(&mut self) {
        if self.cancel.is_cancelled() {
            self.cancel = CancellationToken::new();
        }
    }

    /// Provider family of the codec in use
    pub fn provider_kind(&self) -> ProviderKind {
        self.codec.kind()
    }

    /// Immutable settings the model was built with
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Printer the model narrates through
    pub fn printer(&self) -> &Arc<dyn Printer> {
        &self.printer
    }
}
