//! Model builder
//!
//! Collects settings, validates them on [`ModelBuilder::build`] and returns a
//! [`ChatModel`] wired to the codec of the chosen provider. Choosing a
//! credential also chooses the provider.

use std::sync::Arc;

use crate::agent::{ChatModel, HeuristicEstimator, TokenEstimator};
use crate::core::{
    Config, ModelConfig, ParleyError, Printer, ProviderKind, Result, SummarizerConfig,
    SummaryLanguage,
};
use crate::llm::provider::codec_for;
use crate::llm::traits::ChatTransport;
use crate::llm::transport::HttpTransport;

const DEFAULT_MAX_TRIES: u32 = 50;
const DEFAULT_WAIT_SECONDS: u64 = 6;
const DEFAULT_SUMMARIZER_TEMPERATURE: f32 = 0.3;
const MIN_SUMMARIZER_TOKENS: u32 = 64;

/// Builder for [`ChatModel`]
pub struct ModelBuilder {
    kind: Option<ProviderKind>,
    url: Option<String>,
    api_key: Option<String>,
    name: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    printer: Option<Arc<dyn Printer>>,
    system_prompt: String,
    max_tries: u32,
    wait_seconds: u64,
    summarizer_max_tokens: Option<u32>,
    summarizer_prompts: Option<(String, String)>,
    summarizer_temperature: f32,
    summarizer_disabled: bool,
    transport: Option<Arc<dyn ChatTransport>>,
    estimator: Option<Box<dyn TokenEstimator>>,
}

impl ModelBuilder {
    /// Create a builder with no provider chosen
    pub fn new() -> Self {
        Self {
            kind: None,
            url: None,
            api_key: None,
            name: None,
            max_tokens: None,
            temperature: None,
            printer: None,
            system_prompt: String::new(),
            max_tries: DEFAULT_MAX_TRIES,
            wait_seconds: DEFAULT_WAIT_SECONDS,
            summarizer_max_tokens: None,
            summarizer_prompts: None,
            summarizer_temperature: DEFAULT_SUMMARIZER_TEMPERATURE,
            summarizer_disabled: false,
            transport: None,
            estimator: None,
        }
    }

    /// Seed a builder from the user configuration. The printer still has
    /// to be set.
    pub fn from_config(config: &Config) -> Result<Self> {
        let kind = config.provider_kind()?;
        let key = config.model.api_key.clone();

        let mut builder = match kind {
            ProviderKind::OpenAi => {
                let mut builder = Self::new();
                if let Some(url) = config.model.url.clone() {
                    builder = builder.openai_url(url);
                }
                if let Some(key) = key {
                    builder = builder.openai_api_key(key);
                }
                builder.kind = Some(ProviderKind::OpenAi);
                builder
            }
            ProviderKind::Anthropic => match key {
                Some(key) => Self::new().anthropic_api_key(key),
                None => Self::new().format(ProviderKind::Anthropic),
            },
            ProviderKind::Gemini => match key {
                Some(key) => Self::new().gemini_api_key(key),
                None => Self::new().format(ProviderKind::Gemini),
            },
        };

        builder = builder
            .name(config.model.name.clone())
            .max_tokens(config.model.max_tokens)
            .temperature(config.model.temperature)
            .system_prompt(config.model.system_prompt.clone())
            .max_tries(config.retry.max_tries)
            .wait_seconds(config.retry.wait_seconds);

        let summarizer = &config.summarizer;
        if !summarizer.enabled {
            return Ok(builder.disable_summarizer());
        }

        let max_tokens = summarizer
            .max_tokens
            .unwrap_or_else(|| default_summarizer_tokens(config.model.max_tokens));
        builder
            .summarizer_max_tokens(max_tokens)
            .summarizer_temperature(summarizer.temperature)
            .summarizer_language(&summarizer.language)
    }

    /// Choose the provider without a credential
    pub fn format(mut self, kind: ProviderKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Use OpenAI with an API key
    pub fn openai_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.kind = Some(ProviderKind::OpenAi);
        self.api_key = Some(api_key.into());
        self
    }

    /// Use an OpenAI-compatible server
    pub fn openai_url(mut self, url: impl Into<String>) -> Self {
        self.kind = Some(ProviderKind::OpenAi);
        self.url = Some(url.into());
        self
    }

    /// Use Gemini with an API key
    pub fn gemini_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.kind = Some(ProviderKind::Gemini);
        self.api_key = Some(api_key.into());
        self.url = None;
        self
    }

    /// Use Anthropic with an API key
    pub fn anthropic_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.kind = Some(ProviderKind::Anthropic);
        self.api_key = Some(api_key.into());
        self.url = None;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Response budget, also the history budget that triggers a summary
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the output collaborator
    pub fn printer(mut self, printer: Arc<dyn Printer>) -> Self {
        self.printer = Some(printer);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Attempts per model request
    pub fn max_tries(mut self, max_tries: u32) -> Self {
        self.max_tries = max_tries;
        self
    }

    /// Fixed delay between attempts
    pub fn wait_seconds(mut self, wait_seconds: u64) -> Self {
        self.wait_seconds = wait_seconds;
        self
    }

    /// Token budget of a summary
    pub fn summarizer_max_tokens(mut self, max_tokens: u32) -> Self {
        self.summarizer_max_tokens = Some(max_tokens);
        self
    }

    /// Pick the summarizer prompt preset. Must follow
    /// [`ModelBuilder::summarizer_max_tokens`], whose value the prompt embeds.
    pub fn summarizer_language(mut self, language: &str) -> Result<Self> {
        let max_tokens = self
            .summarizer_max_tokens
            .ok_or(ParleyError::SummarizerOrder)?;
        let language: SummaryLanguage = language.parse()?;

        self.summarizer_prompts = Some((
            language.system_prompt(max_tokens),
            language.user_prompt().to_string(),
        ));
        Ok(self)
    }

    pub fn summarizer_temperature(mut self, temperature: f32) -> Self {
        self.summarizer_temperature = temperature;
        self
    }

    /// Never summarize history
    pub fn disable_summarizer(mut self) -> Self {
        self.summarizer_disabled = true;
        self
    }

    /// Replace the HTTP transport
    pub fn transport(mut self, transport: Arc<dyn ChatTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replace the token estimator
    pub fn estimator(mut self, estimator: impl TokenEstimator + 'static) -> Self {
        self.estimator = Some(Box::new(estimator));
        self
    }

    /// Validate the settings and build the model
    pub fn build(self) -> Result<ChatModel> {
        let kind = self.kind.ok_or(ParleyError::FormatNotSet)?;
        let max_tokens = self.max_tokens.ok_or(ParleyError::missing("max_tokens"))?;
        let temperature = self
            .temperature
            .ok_or(ParleyError::missing("temperature"))?;
        let name = self.name.ok_or(ParleyError::missing("name"))?;
        let printer = self.printer.ok_or(ParleyError::missing("printer"))?;

        match kind {
            ProviderKind::OpenAi if self.api_key.is_none() && self.url.is_none() => {
                return Err(ParleyError::missing("openai_api_key or openai_url"));
            }
            ProviderKind::Gemini if self.api_key.is_none() => {
                return Err(ParleyError::missing("gemini_api_key"));
            }
            ProviderKind::Anthropic if self.api_key.is_none() => {
                return Err(ParleyError::missing("anthropic_api_key"));
            }
            _ => {}
        }

        let summarizer = if self.summarizer_disabled {
            None
        } else {
            let summary_tokens = self
                .summarizer_max_tokens
                .unwrap_or_else(|| default_summarizer_tokens(max_tokens));
            let (system_prompt, user_prompt) = self.summarizer_prompts.unwrap_or_else(|| {
                let language = SummaryLanguage::Italian;
                (
                    language.system_prompt(summary_tokens),
                    language.user_prompt().to_string(),
                )
            });
            SummarizerConfig::from_parts(
                Some(system_prompt),
                Some(user_prompt),
                Some(summary_tokens),
                Some(self.summarizer_temperature),
            )
        };

        let config = ModelConfig {
            kind,
            url: self.url,
            api_key: self.api_key,
            name,
            max_tokens,
            temperature,
            system_prompt: self.system_prompt,
            max_tries: self.max_tries,
            wait_seconds: self.wait_seconds,
            summarizer,
        };

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&config)?),
        };
        let estimator = self
            .estimator
            .unwrap_or_else(|| Box::new(HeuristicEstimator));

        Ok(ChatModel::new(
            config,
            codec_for(kind),
            transport,
            printer,
            estimator,
        ))
    }
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Half the model budget, never below 64 tokens
pub fn default_summarizer_tokens(max_tokens: u32) -> u32 {
    (max_tokens / 2).max(MIN_SUMMARIZER_TOKENS)
}
