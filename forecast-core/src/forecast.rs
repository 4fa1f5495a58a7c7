//! The forecast handler, independent of the HTTP layer.
//!
//! One request runs: validate the location, build the prompt, make one
//! provider call (more only if the retry policy allows), reject empty
//! output, parse the text as JSON and hand the value back untouched.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::{
    Config, Forecast, ForecastRequest,
    config::{DEFAULT_MODEL, DEFAULT_TEMPERATURE},
    prompt::build_prompt,
    provider::{CompletionProvider, CompletionRequest, ProviderError, ProviderId},
    retry::RetryPolicy,
};

pub const MISSING_LOCATION_MESSAGE: &str = "Please provide a location in the request body.";
pub const EMPTY_COMPLETION_MESSAGE: &str = "No response from OpenAI.";
pub const MALFORMED_FORECAST_MESSAGE: &str = "Failed to parse forecast data.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Every way a forecast request can fail. The display text is what the caller sees.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("{}", MISSING_LOCATION_MESSAGE)]
    MissingLocation,

    #[error("{}", EMPTY_COMPLETION_MESSAGE)]
    EmptyCompletion,

    #[error("{}", MALFORMED_FORECAST_MESSAGE)]
    MalformedForecast(#[source] serde_json::Error),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl ForecastError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForecastError::MissingLocation => StatusCode::BAD_REQUEST,
            ForecastError::EmptyCompletion
            | ForecastError::MalformedForecast(_)
            | ForecastError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn public_message(&self) -> String {
        self.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastSettings {
    pub model: String,
    pub temperature: f64,
    pub retry: RetryPolicy,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            retry: RetryPolicy::default(),
        }
    }
}

impl ForecastSettings {
    pub fn from_config(config: &Config, id: ProviderId) -> Self {
        let provider = config.provider_config(id);

        Self {
            model: provider
                .and_then(|p| p.model.clone())
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: provider.and_then(|p| p.temperature).unwrap_or(DEFAULT_TEMPERATURE),
            retry: RetryPolicy::from(&config.retry),
        }
    }
}

/// Built once at startup and shared by every request.
#[derive(Debug, Clone)]
pub struct ForecastService {
    provider: Arc<dyn CompletionProvider>,
    settings: ForecastSettings,
}

impl ForecastService {
    pub fn new(provider: Arc<dyn CompletionProvider>, settings: ForecastSettings) -> Self {
        Self { provider, settings }
    }

    pub async fn forecast(&self, request: &ForecastRequest) -> Result<Forecast, ForecastError> {
        let location = request.validated_location().ok_or(ForecastError::MissingLocation)?;

        let completion = CompletionRequest {
            model: self.settings.model.clone(),
            temperature: self.settings.temperature,
            prompt: build_prompt(location),
        };

        let content = self
            .settings
            .retry
            .run(|| self.provider.complete(&completion))
            .await
            .map_err(|err| {
                tracing::error!(error = %err, location, "completion provider call failed");
                ForecastError::Provider(err)
            })?
            .ok_or(ForecastError::EmptyCompletion)?;

        let forecast: Forecast = serde_json::from_str(&content).map_err(|err| {
            tracing::error!(error = %err, "JSON parsing error in provider output");
            ForecastError::MalformedForecast(err)
        })?;

        let missing = forecast.missing_days();
        if !missing.is_empty() {
            tracing::warn!(?missing, location, "forecast is missing expected days");
        }

        Ok(forecast)
    }
}
