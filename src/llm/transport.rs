//! HTTP transport to the vendor endpoints
//!
//! Posts request bodies produced by a codec to the provider's public
//! endpoint and returns the decoded JSON response.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

use crate::core::{ModelConfig, ProviderError, ProviderKind, Result};
use crate::llm::traits::ChatTransport;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// reqwest-backed [`ChatTransport`]
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    kind: ProviderKind,
    endpoint: String,
    api_key: Option<String>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Create a transport for the provider described by `config`
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(ProviderError::from)?;

        Ok(Self {
            client,
            kind: config.kind,
            endpoint: endpoint_for(config),
            api_key: config.api_key.clone(),
        })
    }

    /// Endpoint the transport posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let Some(key) = self.api_key.as_deref() else {
            return request;
        };

        match self.kind {
            ProviderKind::OpenAi => request.bearer_auth(key),
            ProviderKind::Anthropic => request
                .header("x-api-key", key)
                .header("anthropic-version", ANTHROPIC_VERSION),
            ProviderKind::Gemini => request.query(&[("key", key)]),
        }
    }
}

/// Full request URL for a model config
pub fn endpoint_for(config: &ModelConfig) -> String {
    match config.kind {
        ProviderKind::OpenAi => format!(
            "{}/chat/completions",
            config
                .url
                .as_deref()
                .unwrap_or(OPENAI_BASE_URL)
                .trim_end_matches('/')
        ),
        ProviderKind::Anthropic => ANTHROPIC_URL.to_string(),
        ProviderKind::Gemini => format!("{}/{}:generateContent", GEMINI_BASE_URL, config.name),
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(
        &self,
        body: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        debug!(endpoint = %self.endpoint, "posting model request");

        let mut request = self.client.post(&self.endpoint).json(body);
        if self.kind == ProviderKind::Anthropic && self.api_key.is_none() {
            request = request.header("anthropic-version", ANTHROPIC_VERSION);
        }

        let response = self.authorize(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_body(status.as_u16(), &error_text));
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ProviderError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: ProviderKind, url: Option<&str>) -> ModelConfig {
        ModelConfig {
            kind,
            url: url.map(str::to_string),
            api_key: Some("k".into()),
            name: "m-1".into(),
            max_tokens: 100,
            temperature: 0.5,
            system_prompt: String::new(),
            max_tries: 1,
            wait_seconds: 0,
            summarizer: None,
        }
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(
            endpoint_for(&config(ProviderKind::OpenAi, None)),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            endpoint_for(&config(ProviderKind::OpenAi, Some("http://localhost:8000/v1/"))),
            "http://localhost:8000/v1/chat/completions"
        );
        assert_eq!(
            endpoint_for(&config(ProviderKind::Anthropic, None)),
            "https://api.anthropic.com/v1/messages"
        );
        assert_eq!(
            endpoint_for(&config(ProviderKind::Gemini, None)),
            "https://generativelanguage.googleapis.com/v1beta/models/m-1:generateContent"
        );
    }

    #[test]
    fn test_transport_from_config() {
        let transport = HttpTransport::from_config(&config(ProviderKind::Anthropic, None)).unwrap();
        assert_eq!(transport.endpoint(), ANTHROPIC_URL);
    }
}
