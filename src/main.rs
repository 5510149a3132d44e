//! Parley - provider-agnostic tool-calling conversations
//!
//! Main entry point for the CLI application.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use parley::core::init_logging;
use parley::{Config, ConsolePrinter, ModelBuilder, OfflineToolHost, Repl, Session};

/// Parley - tool-calling conversations with OpenAI, Anthropic and Gemini
#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Provider family: openai, anthropic or gemini
    #[arg(long)]
    provider: Option<String>,

    /// Model name
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Base URL of an OpenAI-compatible server
    #[arg(long)]
    url: Option<String>,

    /// Maximum tokens per response
    #[arg(long)]
    max_tokens: Option<u32>,

    /// Sampling temperature
    #[arg(long, short = 't')]
    temperature: Option<f32>,

    /// System prompt
    #[arg(long, short = 's')]
    system: Option<String>,

    /// Never summarize history
    #[arg(long)]
    no_summarizer: bool,

    /// Enable debug output
    #[arg(long, short = 'd')]
    debug: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(provider) = args.provider {
        config.model.api_key = parley::core::config::api_key_from_env(&provider);
        config.model.provider = provider;
    }
    if let Some(model) = args.model {
        config.model.name = model;
    }
    if let Some(url) = args.url {
        config.model.url = Some(url);
    }
    if let Some(max_tokens) = args.max_tokens {
        config.model.max_tokens = max_tokens;
    }
    if let Some(temperature) = args.temperature {
        config.model.temperature = temperature;
    }
    if let Some(system) = args.system {
        config.model.system_prompt = system;
    }
    if args.no_summarizer {
        config.summarizer.enabled = false;
    }
    if args.debug {
        config.debug = true;
    }

    init_logging(config.debug);

    if args.save_config {
        let path = config.save()?;
        println!("Configuration saved to {}", path.display());
        return Ok(());
    }

    let model = ModelBuilder::from_config(&config)?
        .printer(Arc::new(ConsolePrinter))
        .build()
        .context("failed to build the model")?;
    let session = Session::new(model, Arc::new(OfflineToolHost));

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let mut repl = Repl::new(session);
        repl.initialize().await?;
        repl.run_turn(&prompt).await?;
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::new(session);
    repl.run().await?;

    Ok(())
}
