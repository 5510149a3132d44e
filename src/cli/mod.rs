//! Interactive front end
//!
//! A line-oriented REPL over a [`crate::agent::Session`] plus the handful of
//! local commands it answers without calling the model.

pub mod commands;
pub mod repl;

pub use commands::{handle_command, CommandResult};
pub use repl::Repl;
