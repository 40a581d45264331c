//! Gateway error types.

use thiserror::Error;

/// Errors from exchange gateway calls.
///
/// Transport failures are classified separately from exchange-side
/// rejections so callers can distinguish "retry later" from "do not retry".
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Market data was fetched but is unusable (zero or unparseable).
    #[error("Market data unavailable: {0}")]
    Unavailable(String),

    /// The exchange accepted the request but rejected the order.
    #[error("Order rejected ({status}): {message}")]
    Rejected { status: String, message: String },

    /// Non-success HTTP status from the exchange.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Timeout or connection failure. Always transient.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response body did not match the documented schema.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
