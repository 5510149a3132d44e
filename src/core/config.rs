//! Configuration management for Parley
//!
//! Two layers live here: the immutable [`ModelConfig`] a conversation model is
//! built from, and the user-facing [`Config`] loaded from environment
//! variables and the config file.
//!
//! Config file location: ~/.config/parley/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use crate::core::error::{ParleyError, Result};

/// Vendor API family a model speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI chat completions (and compatible servers)
    OpenAi,
    /// Anthropic messages
    Anthropic,
    /// Google Gemini generateContent
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::OpenAi => write!(f, "openai"),
            ProviderKind::Anthropic => write!(f, "anthropic"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(ParleyError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Settings of the side request that compresses history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarizerConfig {
    pub system_prompt: String,
    /// Prefix placed before the stringified history
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl SummarizerConfig {
    /// Assemble a summarizer config; any missing part disables summarization
    pub fn from_parts(
        system_prompt: Option<String>,
        user_prompt: Option<String>,
        max_tokens: Option<u32>,
        temperature: Option<f32>,
    ) -> Option<Self> {
        Some(Self {
            system_prompt: system_prompt?,
            user_prompt: user_prompt?,
            max_tokens: max_tokens?,
            temperature: temperature?,
        })
    }
}

/// Summarizer prompt presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryLanguage {
    English,
    Italian,
}

impl FromStr for SummaryLanguage {
    type Err = ParleyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(SummaryLanguage::English),
            "italian" => Ok(SummaryLanguage::Italian),
            other => Err(ParleyError::UnsupportedLanguage(other.to_string())),
        }
    }
}

impl SummaryLanguage {
    /// System prompt for a summary of at most `max_tokens` tokens
    pub fn system_prompt(&self, max_tokens: u32) -> String {
        match self {
            SummaryLanguage::English => format!(
                "You are an assistant that summarizes conversations into a single text containing the essential points, prioritizing the latest exchanged messages.\nThe new text must be at most {} tokens long",
                max_tokens
            ),
            SummaryLanguage::Italian => format!(
                "Sei un assistente che riassume le conversazioni in un unico testo che contiene i punti essenziali dando priorità agli ultimi messaggi scambiati.\nIl nuovo testo deve essere lungo massimo {} tokens",
                max_tokens
            ),
        }
    }

    /// Prefix placed before the stringified history
    pub fn user_prompt(&self) -> &'static str {
        match self {
            SummaryLanguage::English => "Briefly summarize the following conversation:\n",
            SummaryLanguage::Italian => "Riassumi brevemente la seguente conversazione:\n",
        }
    }
}

/// Immutable settings of one conversation model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub kind: ProviderKind,
    /// Custom endpoint (OpenAI-compatible servers)
    pub url: Option<String>,
    pub api_key: Option<String>,
    /// Model name sent to the provider
    pub name: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub system_prompt: String,
    pub max_tries: u32,
    pub wait_seconds: u64,
    pub summarizer: Option<SummarizerConfig>,
}

/// Main configuration for the parley binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Model endpoint configuration
    pub model: ModelSettings,
    /// Retry behaviour
    #[serde(default)]
    pub retry: RetrySettings,
    /// History compaction
    #[serde(default)]
    pub summarizer: SummarizerSettings,
    /// Whether to show debug output
    #[serde(default)]
    pub debug: bool,
}

/// Model endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Provider family: openai, anthropic or gemini
    pub provider: String,
    /// Model name
    pub name: String,
    /// Custom base URL for OpenAI-compatible servers
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum tokens per response, also the history budget
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// System prompt
    #[serde(default)]
    pub system_prompt: String,
    /// API key; usually left to the environment
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

/// Retry behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts per model request
    pub max_tries: u32,
    /// Fixed delay between attempts
    pub wait_seconds: u64,
}

/// History compaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerSettings {
    pub enabled: bool,
    /// english or italian
    pub language: String,
    /// Defaults to half the model budget
    #[serde(default)]
    pub max_tokens: Option<u32>,
    pub temperature: f32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let provider = env::var("PARLEY_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let api_key = api_key_from_env(&provider);

        Self {
            provider,
            name: env::var("PARLEY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            url: env::var("PARLEY_URL").ok().filter(|u| !u.is_empty()),
            max_tokens: env::var("PARLEY_MAX_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4096),
            temperature: env::var("PARLEY_TEMPERATURE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.7),
            system_prompt: env::var("PARLEY_SYSTEM_PROMPT").unwrap_or_default(),
            api_key,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_tries: 50,
            wait_seconds: 6,
        }
    }
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            enabled: env::var("PARLEY_SUMMARIZER")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            language: env::var("PARLEY_SUMMARIZER_LANGUAGE")
                .unwrap_or_else(|_| "italian".to_string()),
            max_tokens: None,
            temperature: 0.3,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            retry: RetrySettings::default(),
            summarizer: SummarizerSettings::default(),
            debug: env::var("PARLEY_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

/// Look up the conventional API key variable for a provider
pub fn api_key_from_env(provider: &str) -> Option<String> {
    let var = match provider.to_ascii_lowercase().as_str() {
        "openai" => "OPENAI_API_KEY",
        "anthropic" => "ANTHROPIC_API_KEY",
        "gemini" => "GEMINI_API_KEY",
        _ => return None,
    };
    env::var(var).ok().filter(|k| !k.is_empty())
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("parley")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ParleyError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ParleyError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse a config from TOML text; the API key falls back to the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content)
            .map_err(|e| ParleyError::config(format!("Failed to parse config: {}", e)))?;

        if config.model.api_key.is_none() {
            config.model.api_key = api_key_from_env(&config.model.provider);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| ParleyError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ParleyError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| ParleyError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Parsed provider family
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.model.provider.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_retry_settings() {
        let retry = RetrySettings::default();
        assert_eq!(retry.max_tries, 50);
        assert_eq!(retry.wait_seconds, 6);
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "gemini".parse::<ProviderKind>().unwrap(),
            ProviderKind::Gemini
        );
        let err = "cohere".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.to_string(), "Unsupported model format: cohere");
    }

    #[test]
    fn test_summarizer_from_parts_requires_every_field() {
        assert!(SummarizerConfig::from_parts(
            Some("s".into()),
            Some("u".into()),
            Some(10),
            Some(0.3)
        )
        .is_some());
        assert!(
            SummarizerConfig::from_parts(Some("s".into()), None, Some(10), Some(0.3)).is_none()
        );
    }

    #[test]
    fn test_summary_language_prompts() {
        let english: SummaryLanguage = "English".parse().unwrap();
        assert!(english.system_prompt(128).contains("at most 128 tokens"));
        assert!("klingon".parse::<SummaryLanguage>().is_err());
    }

    #[test]
    fn test_config_from_toml() {
        let config = Config::from_toml(
            r#"
            [model]
            provider = "anthropic"
            name = "claude-sonnet-4-5"
            max_tokens = 2048
            temperature = 0.2
            api_key = "sk-test"

            [retry]
            max_tries = 3
            wait_seconds = 1
            "#,
        )
        .unwrap();

        assert_eq!(config.provider_kind().unwrap(), ProviderKind::Anthropic);
        assert_eq!(config.retry.max_tries, 3);
        assert_eq!(config.model.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model.system_prompt, "");
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("parley"));
    }
}
