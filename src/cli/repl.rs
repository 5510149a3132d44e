//! Interactive REPL for Parley
//!
//! Provides the main user interaction loop.

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::agent::Session;
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{ParleyError, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    session: Session,
}

impl Repl {
    /// Create a REPL around an uninitialized session
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        if let Err(e) = self.initialize().await {
            eprintln!("\nInitialization Error: {}\n", e);
            return Ok(());
        }
        println!();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            print!("You: ");
            stdout.flush()?;

            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.session) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Clear => {
                    println!("Conversation cleared.\n");
                }
                CommandResult::Handled(output) => {
                    println!("{}\n", output);
                }
                CommandResult::Continue(query) => {
                    if let Err(e) = self.run_turn(&query).await {
                        eprintln!("\nError: {}\n", e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Discover the tool host's tools and prompts
    pub async fn initialize(&mut self) -> Result<()> {
        self.session.initialize().await
    }

    /// Run one query; Ctrl+C cancels it
    pub async fn run_turn(&mut self, query: &str) -> Result<String> {
        let cancel = self.session.model().cancellation_token();

        let result = tokio::select! {
            result = self.session.process_query(query) => result,
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                Err(ParleyError::Cancelled)
            }
        };

        if matches!(result, Err(ParleyError::Cancelled)) {
            debug!("turn cancelled");
            self.session.model_mut().reset_cancellation();
        }
        result
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let model = self.session.model();

        println!("Parley - tool-calling conversations with OpenAI, Anthropic and Gemini");
        println!("Provider:   {}", model.provider_kind());
        println!("Model:      {}", model.config().name);
        println!();
        println!("Commands: help, clear, prompts, status, exit");
        println!("─────────────────────────────────────────────");
    }
}
