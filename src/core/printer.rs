//! Output collaborator
//!
//! The conversation loop narrates through three channels: assistant text,
//! system notices and error diagnostics.

/// Receives everything the conversation loop shows to the user
pub trait Printer: Send + Sync {
    /// Assistant text as it arrives
    fn assistant(&self, text: &str);
    /// Informational notices (discovered tools, prompts)
    fn system(&self, text: &str);
    /// One-line diagnostics for transient failures
    fn error(&self, text: &str);
}

/// Printer writing to stdout and stderr
#[derive(Debug, Clone, Default)]
pub struct ConsolePrinter;

impl Printer for ConsolePrinter {
    fn assistant(&self, text: &str) {
        println!("\nAssistant:\n{}\n", text);
    }

    fn system(&self, text: &str) {
        println!("{}", text);
    }

    fn error(&self, text: &str) {
        eprintln!("Error: {}", text);
    }
}

/// Printer that discards everything
#[derive(Debug, Clone, Default)]
pub struct SilentPrinter;

impl Printer for SilentPrinter {
    fn assistant(&self, _text: &str) {}
    fn system(&self, _text: &str) {}
    fn error(&self, _text: &str) {}
}
