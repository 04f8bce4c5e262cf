//! UniCore Security Gateway
//!
//! An admission-control gateway for a university ERP, built with Tokio
//! and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │               SECURITY GATEWAY               │
//!                      │                                              │
//!  Client Request      │  ┌─────────┐   ┌───────────────────────┐    │
//!  ────────────────────┼─▶│  http   │──▶│  admission pipeline   │    │
//!                      │  │ server  │   │ bot → csrf → rate →   │    │
//!                      │  └─────────┘   │ auth                  │    │
//!                      │                └─────┬──────────┬──────┘    │
//!                      │               reject │          │ admit     │
//!  Client Response     │  ┌──────────┐       ▼          ▼           │
//!  ◀───────────────────┼──│ security │◀── JSON error   forward ─────┼──▶ ERP app
//!                      │  │ headers  │◀───────────────  response    │
//!                      │  └──────────┘                              │
//!                      │                                              │
//!                      │  config / observability / lifecycle          │
//!                      └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unicore_gateway::config::loader::load_config;
use unicore_gateway::config::watcher::ConfigWatcher;
use unicore_gateway::{GatewayConfig, GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "unicore-gateway")]
#[command(about = "Admission-control gateway for the UniCore ERP")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unicore_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("unicore-gateway v0.1.0 starting");

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        dev_mode = config.security.dev_mode,
        allowed_origins = config.security.allowed_origins.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => unicore_gateway::observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Hot reload: the watcher handle must outlive the server for events
    // to keep flowing.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, rx) = ConfigWatcher::new(path);
            (Some(watcher.run()?), rx)
        }
        None => {
            let (_tx, rx) = mpsc::unbounded_channel();
            (None, rx)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received");
            shutdown.trigger();
        }
    });

    let server = GatewayServer::new(config);
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
