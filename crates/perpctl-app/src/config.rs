//! Application configuration.
//!
//! Tunables come from a toml file; API credentials come strictly from
//! the process environment and are never part of the config file,
//! never serialized, and never logged.

use crate::error::{AppError, AppResult};
use perpctl_gateway::ExchangeClientConfig;
use perpctl_position::MonitorConfig;
use perpctl_webhook::{ServerConfig, SizingConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "PERPCTL_API_KEY";
/// Environment variable holding the API secret.
pub const ENV_API_SECRET: &str = "PERPCTL_API_SECRET";

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Traded contract identifier.
    #[serde(default = "default_instrument")]
    pub instrument: String,
    /// Exchange REST client settings.
    #[serde(default)]
    pub exchange: ExchangeClientConfig,
    /// Webhook server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Entry sizing settings.
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Take-profit/stop-loss monitor settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
}

fn default_instrument() -> String {
    "BTC-USDT-PERP".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            exchange: ExchangeClientConfig::default(),
            server: ServerConfig::default(),
            sizing: SizingConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from a file. A missing file is a configuration error;
    /// silently trading on defaults is worse than refusing to start.
    pub fn load(config_path: &str) -> AppResult<Self> {
        if !Path::new(config_path).exists() {
            return Err(AppError::Config(format!(
                "Config file not found: {config_path}"
            )));
        }
        Self::from_file(config_path)
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }
}

/// Exchange API credentials, injected via the environment.
pub struct ApiCredentials {
    pub api_key: String,
    pub api_secret: String,
}

impl ApiCredentials {
    /// Read credentials from `PERPCTL_API_KEY` / `PERPCTL_API_SECRET`.
    pub fn from_env() -> AppResult<Self> {
        let api_key = std::env::var(ENV_API_KEY)
            .map_err(|_| AppError::Config(format!("{ENV_API_KEY} not set")))?;
        let api_secret = std::env::var(ENV_API_SECRET)
            .map_err(|_| AppError::Config(format!("{ENV_API_SECRET} not set")))?;

        if api_key.is_empty() || api_secret.is_empty() {
            return Err(AppError::Config(
                "API credentials must be non-empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            api_secret,
        })
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials intentionally omitted.
        f.debug_struct("ApiCredentials").finish_non_exhaustive()
    }
}
