//! Signal handler error taxonomy.
//!
//! Every downstream failure is converted to one of these kinds at the
//! handler boundary; raw transport errors never reach the webhook
//! response path.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use perpctl_gateway::GatewayError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Malformed webhook payload. No gateway calls were made.
    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    /// Price or equity fetch failed; no order was placed.
    #[error("Market data unavailable: {0}")]
    MarketDataUnavailable(#[source] GatewayError),

    /// Exchange rejected the entry order. Not retried, to avoid
    /// duplicate fills.
    #[error("Order rejected ({status}): {message}")]
    OrderRejected { status: String, message: String },

    /// Pre-entry flatten failed; no entry was attempted.
    #[error("Exit failed: {0}")]
    ExitFailed(#[source] GatewayError),

    /// Transport failure while submitting the entry order.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),
}

impl HandlerError {
    /// Outcome label for metrics.
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidSignal(_) => "invalid",
            Self::MarketDataUnavailable(_) => "market_data_unavailable",
            Self::OrderRejected { .. } => "order_rejected",
            Self::ExitFailed(_) => "exit_failed",
            Self::Gateway(_) => "gateway_error",
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidSignal(_) => StatusCode::BAD_REQUEST,
            Self::MarketDataUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::OrderRejected { .. } | Self::ExitFailed(_) | Self::Gateway(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type HandlerResult<T> = std::result::Result<T, HandlerError>;
