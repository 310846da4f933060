//! Event Gate
//!
//! Authentication and rate limiting front for the hackathon platform API.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ request ID ─▶ trace ─▶ timeout
//!                         │
//!                         ▼
//!                  ┌──────────────┐  rate-sensitive route?
//!                  │ rate governor│──── 429 Too Many Requests
//!                  └──────┬───────┘
//!                         ▼
//!                  ┌──────────────┐  cookie / Bearer credential
//!                  │authenticator │──── 401 Unauthorized / 500
//!                  └──────┬───────┘
//!                         ▼
//!                  ┌──────────────┐
//!                  │  role check  │──── 401 Unauthorized
//!                  └──────┬───────┘
//!                         ▼
//!                      handler
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use event_gate::config::{loader, watcher::ConfigWatcher};
use event_gate::lifecycle::{wait_for_ctrl_c, Shutdown};
use event_gate::observability::{logging, metrics};
use event_gate::HttpServer;

#[derive(Parser)]
#[command(name = "event-gate", version, about = "Authentication and rate limiting gate")]
struct Args {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long, env = "EVENT_GATE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => loader::load_config(path)?,
        None => loader::default_config()?,
    };

    logging::init_logging(&config.observability);
    tracing::info!("event-gate v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = ?config.environment,
        request_timeout_secs = config.timeouts.request_secs,
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

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_ctrl_c(shutdown.clone()));

    let server = HttpServer::new(config);
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
