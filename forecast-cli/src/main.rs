//! Binary crate for the `forecast` command-line tool and HTTP service.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Serving `POST /forecast` over HTTP
//! - Interactive configuration
//! - Human-friendly output formatting

use clap::Parser;

mod cli;
mod server;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cmd = cli::Cli::parse();
    init_tracing();
    cmd.run().await
}
