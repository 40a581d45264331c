//! HTTP server exposing the webhook endpoint, using axum.

use crate::error::HandlerError;
use crate::handler::SignalHandler;
use crate::signal::TradeSignal;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use perpctl_gateway::{AccountGateway, MarketDataGateway, OrderGateway};
use perpctl_core::{Direction, Size};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Webhook server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen port. Default: 8080.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Shared application state for axum handlers.
pub struct AppState<G> {
    handler: Arc<SignalHandler<G>>,
}

impl<G> AppState<G> {
    pub fn new(handler: Arc<SignalHandler<G>>) -> Self {
        Self { handler }
    }
}

impl<G> Clone for AppState<G> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Success response for a handled entry signal.
#[derive(Debug, Serialize)]
struct WebhookResponse {
    status: &'static str,
    side: Direction,
    qty: Size,
}

/// Create the axum router.
pub fn create_router<G>(state: AppState<G>) -> Router
where
    G: MarketDataGateway + AccountGateway + OrderGateway + 'static,
{
    Router::new()
        .route("/webhook", post(handle_webhook::<G>))
        .route("/health", get(health))
        .with_state(state)
}

/// Inbound signal endpoint.
///
/// The body is taken as raw JSON first so that a malformed payload is
/// classified as `InvalidSignal` (400) instead of an extractor
/// rejection.
async fn handle_webhook<G>(
    State(state): State<AppState<G>>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<WebhookResponse>, HandlerError>
where
    G: MarketDataGateway + AccountGateway + OrderGateway + 'static,
{
    let signal: TradeSignal = serde_json::from_value(payload)
        .map_err(|e| HandlerError::InvalidSignal(format!("malformed payload: {e}")))?;

    let report = state.handler.handle(signal).await?;

    Ok(Json(WebhookResponse {
        status: "ok",
        side: report.side,
        qty: report.qty,
    }))
}

/// Liveness probe.
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Run the webhook server until the process shuts down.
pub async fn run_server<G>(
    config: ServerConfig,
    state: AppState<G>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    G: MarketDataGateway + AccountGateway + OrderGateway + 'static,
{
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(port = config.port, "Starting webhook server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
