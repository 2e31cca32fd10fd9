//! Round-robin HTTP reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  RR PROXY                    │
//!    Client Request     │  ┌────────┐   ┌─────────┐   ┌────────────┐  │
//!    ───────────────────┼─▶│  http  │──▶│ routing │──▶│    pool    │  │
//!                       │  │ server │   │ Router  │   │ next_live  │  │
//!                       │  └────────┘   └────┬────┘   └─────┬──────┘  │
//!                       │                    │              │         │
//!                       │                    ▼              ▼         │
//!    Client Response    │               ┌──────────────────────┐      │
//!    ◀──────────────────┼───────────────│ Backend::forward     │◀─────┼──── Backend
//!                       │               └──────────────────────┘      │
//!                       │                                             │
//!                       │   health monitor / admin API → liveness     │
//!                       └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;

use rr_proxy::config::{read_config, validate_config, BackendConfig, ConfigError, ProxyConfig};
use rr_proxy::lifecycle::signals::trigger_on_signal;
use rr_proxy::observability::{logging, metrics};
use rr_proxy::{HttpServer, Shutdown};

#[derive(Parser, Debug)]
#[command(name = "rr-proxy", version)]
#[command(about = "Round-robin HTTP reverse proxy", long_about = None)]
struct Args {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listener bind address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend URI; repeat for several. Replaces configured backends.
    #[arg(long = "backend", value_name = "URL")]
    backends: Vec<String>,
}

fn resolve_config(args: &Args) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => ProxyConfig::default(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if !args.backends.is_empty() {
        config.backends = args
            .backends
            .iter()
            .map(|address| BackendConfig::new(address.as_str()))
            .collect();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("rr-proxy: {}", e);
            std::process::exit(2);
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("rr-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backends = config.backends.len(),
        health_checks = config.health_check.enabled,
        admin = config.admin.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    tokio::spawn(trigger_on_signal(shutdown.clone()));

    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
