//! app-gateway binary.
//!
//! Loads configuration, installs logging and metrics, then serves the
//! configured apps behind one HTTP connector until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use app_gateway::config::{load_config, ConfigWatcher, GatewayConfig};
use app_gateway::lifecycle::{signals, Gateway, Shutdown};
use app_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "app-gateway")]
#[command(about = "Routes requests to deployed apps by context path", long_about = None)]
struct Cli {
    /// TOML configuration file; watched for app table changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Show failure causes on error pages.
    #[arg(long)]
    dev_mode: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if cli.dev_mode {
        config.server.dev_mode = true;
    }

    logging::init(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "app-gateway starting");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // Keep the watcher alive for the whole run.
    let (_watcher, config_updates) = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.apps.clone());
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
    signals::spawn_signal_handler(shutdown.clone());

    Gateway::build(config).run(listener, config_updates, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
