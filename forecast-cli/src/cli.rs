use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use forecast_core::{
    Config, Forecast, ForecastRequest, ForecastService, ForecastSettings, ProviderId,
    config::DEFAULT_MODEL, prompt::FORECAST_KEYS, provider::default_provider_from_config,
};
use inquire::{Password, PasswordDisplayMode, Text};

use crate::server;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "forecast", version, about = "Sports-announcer weather forecasts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server.
    Serve {
        /// Listen port; overrides PORT and the config file.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openai".
        provider: String,
    },

    /// Print a forecast for a location without starting the server.
    Show {
        /// City or location name.
        location: String,

        /// Print the raw JSON result instead of one line per day.
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Serve { port } => {
                let config = Config::load_with_env()?;
                let service = build_service(&config)?;
                let port = port.unwrap_or_else(|| config.port());

                server::run_http_server(Arc::new(service), port).await?;
            }
            Command::Configure { provider } => {
                let id = ProviderId::try_from(provider.as_str())?;
                configure(id)?;
            }
            Command::Show { location, json } => {
                let config = Config::load_with_env()?;
                let service = build_service(&config)?;

                let forecast = service.forecast(&ForecastRequest::new(location)).await?;

                if json {
                    println!("{}", serde_json::to_string_pretty(&forecast)?);
                } else {
                    print!("{}", render_forecast(&forecast));
                }
            }
        }

        Ok(())
    }
}

fn build_service(config: &Config) -> anyhow::Result<ForecastService> {
    let id = config.default_provider_id()?;
    let provider = default_provider_from_config(config)?;
    let settings = ForecastSettings::from_config(config, id);

    tracing::info!(
        provider = %id,
        model = %settings.model,
        temperature = settings.temperature,
        max_retries = settings.retry.max_retries,
        "forecast service configured"
    );

    Ok(ForecastService::new(Arc::from(provider), settings))
}

fn configure(id: ProviderId) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = Password::new(&format!("API key for {id}:"))
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let current_model = config
        .provider_config(id)
        .and_then(|p| p.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let model = Text::new("Model:")
        .with_default(&current_model)
        .prompt()
        .context("Failed to read model name")?;

    config.upsert_provider_api_key(id, api_key.trim().to_string());
    config.set_default_provider(id);
    if let Some(provider) = config.providers.get_mut(id.as_str()) {
        provider.model = Some(model);
    }

    config.save()?;

    println!("Saved {id} credentials to {}", Config::config_file_path()?.display());
    Ok(())
}

/// One line per expected day; extra keys are ignored.
fn render_forecast(forecast: &Forecast) -> String {
    if !forecast.0.is_object() {
        return format!("{}\n", forecast.0);
    }

    FORECAST_KEYS
        .iter()
        .enumerate()
        .map(|(i, key)| {
            let text = forecast.day(key).unwrap_or("(no forecast)");
            format!("Day {}: {text}\n", i + 1)
        })
        .collect()
}
