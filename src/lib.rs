//! Parley - provider-agnostic tool-calling conversations
//!
//! Sends user queries to an OpenAI, Anthropic or Gemini model, lets the
//! model call tools exposed by a tool host, feeds the results back and
//! repeats until the model answers. History is kept within the model's
//! token budget by summarizing older turns.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider codecs, HTTP transport, retry policy and model builder
//! - **Tools**: Tool host contract and argument normalization
//! - **Agent**: The conversation loop, its history and the tool session
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use parley::{ConsolePrinter, ModelBuilder, OfflineToolHost, Session};
//!
//! #[tokio::main]
//! async fn main() -> parley::Result<()> {
//!     let model = ModelBuilder::new()
//!         .anthropic_api_key("sk-ant-...")
//!         .name("claude-sonnet-4-5")
//!         .max_tokens(4096)
//!         .temperature(0.7)
//!         .printer(Arc::new(ConsolePrinter))
//!         .build()?;
//!
//!     let mut session = Session::new(model, Arc::new(OfflineToolHost));
//!     session.initialize().await?;
//!     session.process_query("Write a haiku about borrow checking").await?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{ChatModel, Session};
pub use cli::Repl;
pub use core::{Config, ConsolePrinter, ParleyError, Printer, Result};
pub use llm::ModelBuilder;
pub use tools::{OfflineToolHost, ToolHost};
