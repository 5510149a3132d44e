//! Tool session
//!
//! Binds a conversation model to a tool host: discovers tools and prompts
//! once, advertises prompts as slash commands in the system instruction,
//! and forwards queries to the model.

use std::sync::Arc;

use tracing::info;

use crate::agent::model::ChatModel;
use crate::core::{PromptInfo, Result};
use crate::tools::ToolHost;

/// A conversation model wired to a tool host
pub struct Session {
    model: ChatModel,
    host: Arc<dyn ToolHost>,
    prompts: Vec<PromptInfo>,
}

impl Session {
    /// Attach `host` to `model`
    pub fn new(mut model: ChatModel, host: Arc<dyn ToolHost>) -> Self {
        model.attach_tool_host(Arc::clone(&host));
        Self {
            model,
            host,
            prompts: Vec::new(),
        }
    }

    /// Discover tools and prompts and register them with the model
    pub async fn initialize(&mut self) -> Result<()> {
        let tools = self.host.list_tools().await?;
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        self.model
            .printer()
            .system(&format!("Available tools: {}", names.join(", ")));

        let prompts = self.host.list_prompts().await?;
        let names: Vec<&str> = prompts.iter().map(|p| p.name.as_str()).collect();
        self.model
            .printer()
            .system(&format!("Available prompts: {}", names.join(", ")));

        info!(tools = tools.len(), prompts = prompts.len(), "tool host discovered");
        self.model.register_tools(&tools);

        if !prompts.is_empty() {
            let commands = prompts
                .iter()
                .map(|p| format!("/{} - {}", p.name, p.description.as_deref().unwrap_or("")))
                .collect::<Vec<_>>()
                .join("\n");
            let system = format!(
                "{}\nThe following commands are available: {}",
                self.model.system(),
                commands
            );
            self.model.set_system(system);
        }

        self.prompts = prompts;
        Ok(())
    }

    /// Run one query through the model
    pub async fn process_query(&mut self, query: &str) -> Result<String> {
        self.model.process_query(query).await
    }

    /// Prompts discovered by [`Session::initialize`]
    pub fn prompts(&self) -> &[PromptInfo] {
        &self.prompts
    }

    pub fn model(&self) -> &ChatModel {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut ChatModel {
        &mut self.model
    }
}
