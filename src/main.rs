//! Gateway core reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                     GATEWAY                      │
//!                         │                                                  │
//!     Client Request      │  ┌─────────┐    ┌──────────┐    ┌────────────┐   │
//!     ────────────────────┼─▶│  http   │───▶│ routing  │───▶│  pattern   │   │
//!                         │  │ server  │    │ resolver │    │  matcher   │   │
//!                         │  └────┬────┘    └──────────┘    └────────────┘   │
//!                         │       │                                          │
//!                         │       ▼                                          │
//!                         │  ┌──────────┐   ┌────────────┐                   │
//!                         │  │ request  │──▶│ expression │                   │
//!                         │  │ builder  │   │ evaluator  │                   │
//!                         │  └────┬─────┘   └────────────┘                   │
//!                         │       ▼                                          │
//!     Client Response     │  ┌──────────┐   ┌────────────┐                   │
//!     ◀───────────────────┼──│ response │◀──│  upstream  │◀──────────────────┼── Upstream
//!                         │  │ builder  │   │  clients   │                   │
//!                         │  └──────────┘   └────────────┘                   │
//!                         │                                                  │
//!                         │  config → settings (hot reload) · observability  │
//!                         └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use gateway_core::config::{load_options, watcher::ConfigWatcher};
use gateway_core::lifecycle::{signals, Shutdown};
use gateway_core::observability::{logging, metrics};
use gateway_core::{GatewayServer, GatewaySettingsProvider};

#[derive(Parser)]
#[command(name = "gateway-core")]
#[command(about = "Configurable reverse proxy", long_about = None)]
struct Cli {
    /// Configuration file (JSON, or TOML with a .toml extension)
    #[arg(short, long, default_value = "gateway.json")]
    config: PathBuf,

    /// Overrides `server.bindAddress`
    #[arg(short, long)]
    bind: Option<String>,

    /// Overrides `server.logLevel`
    #[arg(short, long)]
    log_level: Option<String>,

    /// Do not watch the configuration file for changes
    #[arg(long)]
    no_watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let options = match load_options(&cli.config) {
        Ok(options) => options,
        Err(e) => {
            logging::init_logging(cli.log_level.as_deref().unwrap_or("info"));
            tracing::error!(path = ?cli.config, error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    let log_level = cli.log_level.as_deref().unwrap_or(&options.server.log_level);
    logging::init_logging(log_level);

    tracing::info!("gateway-core v{} starting", env!("CARGO_PKG_VERSION"));

    let bind_address = cli
        .bind
        .clone()
        .unwrap_or_else(|| options.server.bind_address.clone());

    tracing::info!(
        path = ?cli.config,
        bind_address = %bind_address,
        routes = options.routes.len(),
        "Configuration loaded"
    );

    if let Some(address) = &options.server.metrics_address {
        match address.parse() {
            Ok(addr) => {
                metrics::init_metrics(addr);
            }
            Err(e) => {
                tracing::error!(metrics_address = %address, error = %e, "Failed to parse metrics address");
            }
        }
    }

    let provider = Arc::new(GatewaySettingsProvider::from_options(&options));

    // The watcher handle must stay alive for the whole run
    let (_watcher, updates) = if cli.no_watch {
        (None, None)
    } else {
        let (watcher, updates) = ConfigWatcher::new(&cli.config);
        match watcher.run() {
            Ok(handle) => (Some(handle), Some(updates)),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher failed to start, hot reload disabled");
                (None, None)
            }
        }
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = GatewayServer::new(provider);
    server.run(listener, updates, shutdown.signalled()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
