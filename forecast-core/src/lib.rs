//! Core library for the `forecast` service.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The completion provider abstraction and its OpenAI client
//! - Prompt construction and the forecast handler logic
//! - Shared domain models (requests, responses, error bodies)
//!
//! It is used by `forecast-cli`, which puts an HTTP server and a CLI in front of it.

pub mod config;
pub mod forecast;
pub mod model;
pub mod prompt;
pub mod provider;
pub mod retry;

pub use config::{Config, ProviderConfig, RetryConfig};
pub use forecast::{ForecastError, ForecastService, ForecastSettings};
pub use model::{ErrorBody, Forecast, ForecastEnvelope, ForecastRequest};
pub use provider::{CompletionProvider, CompletionRequest, ProviderError, ProviderId};
pub use retry::RetryPolicy;
