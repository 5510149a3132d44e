//! Core module - shared infrastructure for Parley
//!
//! This module contains foundational types, configuration, and error handling
//! used throughout the crate.

pub mod config;
pub mod error;
pub mod printer;
pub mod telemetry;
pub mod types;

pub use config::{Config, ModelConfig, ProviderKind, SummarizerConfig, SummaryLanguage};
pub use error::{ParleyError, ProviderError, Result, ToolHostError};
pub use printer::{ConsolePrinter, Printer, SilentPrinter};
pub use telemetry::init_logging;
pub use types::*;
