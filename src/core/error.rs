//! Custom error types for Parley
//!
//! Provides a unified error handling system across all modules.

use thiserror::Error;

/// Main error type for Parley operations
#[derive(Error, Debug)]
pub enum ParleyError {
    /// No provider format was chosen on the builder
    #[error("Model format not set")]
    FormatNotSet,

    /// A required builder setter was never called
    #[error("You must call {setter} before building the model")]
    MissingSetting { setter: &'static str },

    /// Provider name that does not map to a known adapter
    #[error("Unsupported model format: {0}")]
    UnsupportedFormat(String),

    /// Summarizer language without a prompt preset
    #[error("Unsupported language for summarizer: {0}")]
    UnsupportedLanguage(String),

    /// Summarizer language chosen before its token budget
    #[error("You must call summarizer_max_tokens before setting the language")]
    SummarizerOrder,

    /// Configuration file errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Every request attempt failed
    #[error("No response from the model after all attempts")]
    NoResponse,

    /// The model answered with something we cannot interpret
    #[error("Invalid model response: {0}")]
    InvalidResponse(String),

    /// Tool host failures that are not retried
    #[error("Tool host error: {0}")]
    ToolHost(#[from] ToolHostError),

    /// Model endpoint failures
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The turn was cancelled while waiting
    #[error("Turn cancelled")]
    Cancelled,

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Parley operations
pub type Result<T> = std::result::Result<T, ParleyError>;

impl ParleyError {
    /// Create a missing-setter error
    pub fn missing(setter: &'static str) -> Self {
        Self::MissingSetting { setter }
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors reported by the tool host session
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolHostError {
    /// Protocol-level failure; the call may succeed when repeated
    #[error("{0}")]
    Protocol(String),

    /// The host cannot serve the request at all
    #[error("tool host unavailable: {0}")]
    Unavailable(String),
}

impl ToolHostError {
    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

/// Errors raised by a model endpoint call
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The endpoint answered with a non-success status
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// The request never reached the endpoint
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with something that is not JSON
    #[error("decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Build an API error from a status code and the raw response body.
    ///
    /// All three vendors nest the human-readable text under
    /// `error.message`; anything else falls back to the raw text.
    pub fn from_body(status: u16, raw: &str) -> Self {
        let body: Option<serde_json::Value> = serde_json::from_str(raw).ok();
        let message = body
            .as_ref()
            .and_then(|b| b.pointer("/error/message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string());

        Self::Api {
            status,
            message,
            body,
        }
    }

    /// HTTP status, when the endpoint answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message text used for classification and reporting
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Provider status string nested under `error.status`, if any
    pub fn error_status(&self) -> Option<&str> {
        match self {
            Self::Api {
                body: Some(body), ..
            } => body.pointer("/error/status").and_then(|s| s.as_str()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}
