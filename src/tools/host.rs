//! Tool host contract
//!
//! A tool host exposes discoverable tools and prompts and executes tool
//! calls. How the session reaches the host is up to the implementation.

use async_trait::async_trait;

use crate::core::{PromptInfo, PromptMessage, ToolDescriptor, ToolHostError, ToolOutput};

/// Result type for tool host calls
pub type HostResult<T> = std::result::Result<T, ToolHostError>;

/// Session with an external tool host
#[async_trait]
pub trait ToolHost: Send + Sync {
    /// Tools the host can execute
    async fn list_tools(&self) -> HostResult<Vec<ToolDescriptor>>;

    /// Prompts in the host's catalog
    async fn list_prompts(&self) -> HostResult<Vec<PromptInfo>>;

    /// Expand a catalog prompt; unknown names fail with a protocol error
    async fn get_prompt(&self, name: &str) -> HostResult<Vec<PromptMessage>>;

    /// Execute a tool with already-normalized arguments
    async fn call_tool(&self, name: &str, arguments: serde_json::Value)
        -> HostResult<ToolOutput>;
}

/// Host with an empty catalog, used when no tool host is configured
#[derive(Debug, Clone, Default)]
pub struct OfflineToolHost;

#[async_trait]
impl ToolHost for OfflineToolHost {
    async fn list_tools(&self) -> HostResult<Vec<ToolDescriptor>> {
        Ok(Vec::new())
    }

    async fn list_prompts(&self) -> HostResult<Vec<PromptInfo>> {
        Ok(Vec::new())
    }

    async fn get_prompt(&self, name: &str) -> HostResult<Vec<PromptMessage>> {
        Err(ToolHostError::protocol(format!("Unknown prompt: {}", name)))
    }

    async fn call_tool(
        &self,
        name: &str,
        _arguments: serde_json::Value,
    ) -> HostResult<ToolOutput> {
        Err(ToolHostError::Unavailable(format!(
            "no tool host configured to run {}",
            name
        )))
    }
}
