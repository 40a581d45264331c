//! perpctl - single-position perpetual futures trading controller.
//!
//! Receives webhook entry signals, sizes and places market orders, and
//! runs a background take-profit/stop-loss monitor over the one open
//! position.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Single-position perpetual futures trading controller
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via PERPCTL_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    perpctl_telemetry::init_logging()?;

    info!("Starting perpctl v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > PERPCTL_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("PERPCTL_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = perpctl_app::AppConfig::load(&config_path)?;
    info!(
        instrument = %config.instrument,
        base_url = %config.exchange.base_url,
        "Configuration loaded"
    );

    // Credentials come only from the environment.
    let credentials = perpctl_app::ApiCredentials::from_env()?;

    let app = perpctl_app::Application::new(config)?;
    app.run(credentials).await?;

    Ok(())
}
