//! Generation relay (v1)
//!
//! A small HTTP relay in front of a generative-content API, built with Tokio
//! and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌────────────────────────────────────────────────────┐
//!                          │                  GENERATION RELAY                   │
//!                          │                                                     │
//!  POST /api/ai/generate   │  ┌──────────┐   ┌──────────┐   ┌───────────────┐   │
//!  ────────────────────────┼─▶│  http    │──▶│ generate │──▶│ client cache  │   │
//!  X-API-Key + JSON body   │  │ server   │   │ handler  │   │ (per API key) │   │
//!                          │  └──────────┘   └────┬─────┘   └───────┬───────┘   │
//!                          │                      │                 │           │
//!                          │                      ▼                 ▼           │
//!                          │               ┌────────────┐   ┌───────────────┐   │
//!                          │               │  content   │──▶│ gemini client │───┼──▶ Gemini API
//!                          │               │ translation│   │               │   │
//!                          │               └────────────┘   └───────────────┘   │
//!  {"text"} / {"error"}    │                                                     │
//!  ◀───────────────────────┼──  config · observability · lifecycle              │
//!                          └────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use generation_relay::config::{load_config, validate_config, RelayConfig};
use generation_relay::observability::{logging, metrics};
use generation_relay::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "generation-relay")]
#[command(about = "HTTP relay for generative-content requests", long_about = None)]
struct Args {
    /// Path to a TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address (e.g. 127.0.0.1:5001).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(|errors| {
            errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        })?;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "generation-relay starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        model = %config.upstream.model,
        upstream = %config.upstream.base_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
