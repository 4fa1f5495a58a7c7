use crate::{Config, provider::openai::OpenAiProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::{convert::TryFrom, fmt::Debug, time::Duration};
use thiserror::Error;

pub mod openai;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    OpenAi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::OpenAi]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: openai."
            )),
        }
    }
}

/// One chat completion: a single user message.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub temperature: f64,
    pub prompt: String,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to reach completion provider: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Completion request failed with status {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Failed to decode completion response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ProviderError {
    /// Timeouts, connection failures, 408, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Transport(err) => err.is_timeout() || err.is_connect(),
            ProviderError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::TOO_MANY_REQUESTS
                    || *status == StatusCode::REQUEST_TIMEOUT
            }
            ProviderError::Decode(_) => false,
        }
    }
}

/// A remote completion service.
///
/// `Ok(None)` means the provider answered without any text.
#[async_trait]
pub trait CompletionProvider: Send + Sync + Debug {
    async fn complete(&self, request: &CompletionRequest) -> Result<Option<String>, ProviderError>;
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
) -> anyhow::Result<Box<dyn CompletionProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: set OPENAI_API_KEY or run `forecast configure {id}` and enter your API key."
        )
    })?;

    let settings = config.provider_config(id);

    let boxed: Box<dyn CompletionProvider> = match id {
        ProviderId::OpenAi => {
            let mut provider = OpenAiProvider::new(api_key.to_owned());
            if let Some(url) = settings.and_then(|s| s.base_url.as_deref()) {
                provider = provider.with_base_url(url);
            }
            if let Some(secs) = settings.and_then(|s| s.timeout_secs) {
                provider = provider.with_timeout(Duration::from_secs(secs));
            }
            Box::new(provider)
        }
    };

    Ok(boxed)
}

/// Construct the default provider from config, using `default_provider` field.
pub fn default_provider_from_config(
    config: &Config,
) -> anyhow::Result<Box<dyn CompletionProvider>> {
    let id = config.default_provider_id()?;
    provider_from_config(id, config)
}
