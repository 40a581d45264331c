//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Core error: {0}")]
    Core(#[from] perpctl_core::CoreError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] perpctl_gateway::GatewayError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] perpctl_telemetry::TelemetryError),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
