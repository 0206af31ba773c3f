//! Legacy redirect edge (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                 REDIRECT EDGE                │
//!   Client Request      │  ┌────────┐   ┌─────────────┐                │
//!   ────────────────────┼─▶│  http  │──▶│  redirect   │                │
//!                       │  │ server │   │  resolver   │                │
//!                       │  └────────┘   └──────┬──────┘                │
//!                       │       ▲              │ lookup only           │
//!                       │       │              ▼                       │
//!                       │       │       ┌─────────────┐   ┌─────────┐  │
//!                       │       │       │    table    │──▶│  blob   │──┼──▶ Object Store
//!                       │       │       │  provider   │   │ source  │  │
//!                       │       │       └─────────────┘   └─────────┘  │
//!   301 / 404           │       │                                      │
//!   ◀───────────────────┼───────┤       pass-through                   │
//!                       │       └──────── origin client ◀──────────────┼──── Origin
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use legacy_redirect::config::load_config;
use legacy_redirect::lifecycle::{signals, Shutdown};
use legacy_redirect::observability::{logging, metrics};
use legacy_redirect::HttpServer;

#[derive(Parser)]
#[command(name = "legacy-redirect")]
#[command(about = "Edge service redirecting legacy query URLs to their new paths", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "legacy-redirect.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", cli.config.display(), e);
            std::process::exit(2);
        }
    };

    logging::init(&config.observability);
    tracing::info!("legacy-redirect v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_connections = config.listener.max_connections,
        origin = %config.origin.address,
        profile = ?config.redirect.profile,
        fetch_timeout_ms = config.redirect.fetch_timeout_ms,
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
    let server = HttpServer::new(config)?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_shutdown().await;
        trigger.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
