//! Main application orchestration.
//!
//! Wires the signed exchange client into the two consumers that share
//! the position book:
//! - the webhook server (entry signals)
//! - the background risk monitor (take-profit / stop-loss exits)

use crate::config::{ApiCredentials, AppConfig};
use crate::error::{AppError, AppResult};
use perpctl_core::Instrument;
use perpctl_gateway::{ExchangeClient, RequestSigner};
use perpctl_position::{PositionBook, RiskMonitor};
use perpctl_webhook::{run_server, AppState, SignalHandler};
use std::sync::Arc;
use tracing::{error, info};

/// Main application.
pub struct Application {
    config: AppConfig,
    instrument: Instrument,
}

impl Application {
    /// Create a new application from a loaded configuration.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        let instrument: Instrument = config.instrument.parse()?;
        Ok(Self { config, instrument })
    }

    /// Run the controller until a shutdown signal arrives or the
    /// webhook server fails.
    pub async fn run(self, credentials: ApiCredentials) -> AppResult<()> {
        info!(
            instrument = %self.instrument,
            base_url = %self.config.exchange.base_url,
            port = self.config.server.port,
            "Starting application"
        );

        let signer = RequestSigner::new(credentials.api_key, credentials.api_secret);
        let gateway = Arc::new(ExchangeClient::new(self.config.exchange.clone(), signer)?);

        let book = Arc::new(PositionBook::new());

        // Background exit loop; failures inside it are logged, never fatal.
        let monitor = RiskMonitor::new(
            self.config.monitor.clone(),
            self.instrument.clone(),
            book.clone(),
            gateway.clone(),
        );
        let monitor_handle = tokio::spawn(monitor.run());

        let handler = SignalHandler::new(
            self.instrument.clone(),
            self.config.sizing.clone(),
            book,
            gateway,
        );
        let state = AppState::new(Arc::new(handler));

        let server_config = self.config.server.clone();
        let server_handle = tokio::spawn(async move { run_server(server_config, state).await });

        let result = tokio::select! {
            outcome = server_handle => {
                match outcome {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => {
                        error!(error = %e, "Webhook server failed");
                        Err(AppError::Server(e.to_string()))
                    }
                    Err(e) => Err(AppError::Server(format!("Server task panicked: {e}"))),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                Ok(())
            }
        };

        monitor_handle.abort();
        info!("Shutting down");

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty_instrument() {
        let config = AppConfig {
            instrument: String::new(),
            ..AppConfig::default()
        };
        assert!(Application::new(config).is_err());
    }

    #[test]
    fn test_new_accepts_default_config() {
        assert!(Application::new(AppConfig::default()).is_ok());
    }
}
