//! CLI commands
//!
//! Local commands handled by the REPL itself. Everything else, slash
//! prompts included, is a query for the session.

use crate::agent::Session;

/// Result of parsing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Send the input to the session
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// History was cleared
    Clear,
}

/// Parse and handle local commands
pub fn handle_command(input: &str, session: &mut Session) -> CommandResult {
    let input = input.trim();
    let cmd = input.split_whitespace().next().unwrap_or("").to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => CommandResult::Exit,

        "clear" | "reset" => {
            session.model_mut().clear();
            CommandResult::Clear
        }

        "help" | "?" => CommandResult::Handled(help_text()),

        "status" => CommandResult::Handled(status_text(session)),

        "prompts" => CommandResult::Handled(prompts_text(session)),

        _ => CommandResult::Continue(input.to_string()),
    }
}

fn status_text(session: &Session) -> String {
    let model = session.model();
    let config = model.config();
    format!(
        "Parley Status:\n\
         ─────────────────────────────\n\
         Provider:     {}\n\
         Model:        {}\n\
         Max tokens:   {}\n\
         Temperature:  {}\n\
         Summarizer:   {}\n\
         History:      {} turns",
        model.provider_kind(),
        config.name,
        config.max_tokens,
        config.temperature,
        if config.summarizer.is_some() { "on" } else { "off" },
        model.messages().len()
    )
}

fn prompts_text(session: &Session) -> String {
    if session.prompts().is_empty() {
        return "No prompts available.".to_string();
    }
    session
        .prompts()
        .iter()
        .map(|p| format!("  /{} - {}", p.name, p.description.as_deref().unwrap_or("")))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate help text
fn help_text() -> String {
    r#"Parley Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit Parley
  clear, reset     Clear conversation history
  status           Show current configuration
  prompts          List prompts offered by the tool host

  /<prompt> ...    Expand a tool host prompt into the conversation

Keyboard Shortcuts:
  Ctrl+C           Cancel the current turn
  Ctrl+D           Exit Parley
─────────────────────────────────────────────"#
        .to_string()
}
