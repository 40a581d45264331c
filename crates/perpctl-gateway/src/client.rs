//! REST client implementing the gateway contracts.
//!
//! Every call is signed by the shared `RequestSigner` and bounded by the
//! client-level timeout so a hung exchange call cannot wedge the monitor
//! loop or a webhook request.

use crate::error::{GatewayError, GatewayResult};
use crate::signer::RequestSigner;
use crate::traits::{AccountGateway, MarketDataGateway, OrderAck, OrderGateway, OrderRequest};
use async_trait::async_trait;
use perpctl_core::{Instrument, OrderSide, Price, Size};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Exchange REST client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeClientConfig {
    /// Base URL of the exchange REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout (ms).
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    "https://api.example-exchange.com".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for ExchangeClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Mark price response from `GET /api/v1/ticker`.
#[derive(Debug, Deserialize)]
struct TickerResponse {
    #[serde(rename = "markPrice")]
    mark_price: Decimal,
}

/// Balance response from `GET /api/v1/balance`.
#[derive(Debug, Deserialize)]
struct BalanceResponse {
    #[serde(rename = "availableBalance")]
    available_balance: Decimal,
}

/// Position response from `GET /api/v1/position`.
///
/// `size` is the unsigned quantity held; the exchange reports direction
/// separately and the controller only needs the close quantity. Missing
/// field means flat.
#[derive(Debug, Deserialize)]
struct PositionResponse {
    #[serde(default)]
    size: Decimal,
}

/// Order submission body for `POST /api/v1/orders`.
#[derive(Debug, Serialize)]
struct OrderBody<'a> {
    instrument: &'a str,
    side: OrderSide,
    #[serde(rename = "type")]
    order_type: &'a str,
    quantity: Decimal,
    #[serde(rename = "reduceOnly")]
    reduce_only: bool,
}

/// Order response from `POST /api/v1/orders`.
#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(rename = "orderId")]
    order_id: String,
    status: String,
    #[serde(default)]
    message: String,
}

/// Statuses the exchange documents as accepted-or-better.
const ACCEPTED_STATUSES: &[&str] = &["NEW", "ACCEPTED", "FILLED", "PARTIALLY_FILLED"];

/// Signed REST client for the exchange.
pub struct ExchangeClient {
    client: Client,
    base_url: String,
    signer: RequestSigner,
}

impl ExchangeClient {
    /// Create a new exchange client.
    pub fn new(config: ExchangeClientConfig, signer: RequestSigner) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    async fn signed_get<T: DeserializeOwned>(&self, path_and_query: &str) -> GatewayResult<T> {
        let url = format!("{}{}", self.base_url, path_and_query);
        let mut request = self.client.get(&url);
        for (name, value) in self.signer.headers("GET", path_and_query, "") {
            request = request.header(name, value);
        }

        let response = request.send().await?;
        Self::decode(response).await
    }

    /// Sign and send a POST. The body is serialized once and those exact
    /// bytes are both hashed into the signature and sent on the wire.
    async fn signed_post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> GatewayResult<T> {
        let body_json = serde_json::to_string(body)
            .map_err(|e| GatewayError::InvalidResponse(format!("body serialization: {e}")))?;

        let url = format!("{}{}", self.base_url, path);
        let mut request = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json");
        for (name, value) in self.signer.headers("POST", path, &body_json) {
            request = request.header(name, value);
        }

        let response = request.body(body_json).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> GatewayResult<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl MarketDataGateway for ExchangeClient {
    async fn mark_price(&self, instrument: &Instrument) -> GatewayResult<Price> {
        let path = format!("/api/v1/ticker?instrument={instrument}");
        let ticker: TickerResponse = self.signed_get(&path).await?;

        let price = Price::new(ticker.mark_price);
        if !price.is_positive() {
            return Err(GatewayError::Unavailable(format!(
                "non-positive mark price {price} for {instrument}"
            )));
        }

        debug!(%instrument, %price, "Fetched mark price");
        Ok(price)
    }
}

#[async_trait]
impl AccountGateway for ExchangeClient {
    async fn available_balance(&self) -> GatewayResult<Decimal> {
        let balance: BalanceResponse = self.signed_get("/api/v1/balance").await?;
        debug!(balance = %balance.available_balance, "Fetched available balance");
        Ok(balance.available_balance)
    }

    async fn live_position_size(&self, instrument: &Instrument) -> GatewayResult<Size> {
        let path = format!("/api/v1/position?instrument={instrument}");
        let position: PositionResponse = self.signed_get(&path).await?;
        debug!(%instrument, size = %position.size, "Fetched live position size");
        Ok(Size::new(position.size))
    }
}

#[async_trait]
impl OrderGateway for ExchangeClient {
    async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderAck> {
        let body = OrderBody {
            instrument: order.instrument.as_str(),
            side: order.side,
            order_type: "market",
            quantity: order.quantity.inner(),
            reduce_only: order.reduce_only,
        };

        let response: OrderResponse = self.signed_post("/api/v1/orders", &body).await?;

        if !ACCEPTED_STATUSES.contains(&response.status.as_str()) {
            warn!(
                instrument = %order.instrument,
                side = %order.side,
                quantity = %order.quantity,
                status = %response.status,
                "Order rejected by exchange"
            );
            return Err(GatewayError::Rejected {
                status: response.status,
                message: response.message,
            });
        }

        info!(
            instrument = %order.instrument,
            side = %order.side,
            quantity = %order.quantity,
            reduce_only = order.reduce_only,
            order_id = %response.order_id,
            status = %response.status,
            "Order accepted"
        );

        Ok(OrderAck {
            order_id: response.order_id,
            status: response.status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_order_body_serialization() {
        let body = OrderBody {
            instrument: "BTC-USDT-PERP",
            side: OrderSide::Buy,
            order_type: "market",
            quantity: dec!(9),
            reduce_only: false,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(
            json,
            r#"{"instrument":"BTC-USDT-PERP","side":"buy","type":"market","quantity":"9","reduceOnly":false}"#
        );
    }

    #[test]
    fn test_ticker_response_parse() {
        let ticker: TickerResponse =
            serde_json::from_str(r#"{"markPrice":"100.5"}"#).unwrap();
        assert_eq!(ticker.mark_price, dec!(100.5));
    }

    #[test]
    fn test_position_response_defaults_to_flat() {
        let position: PositionResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(position.size, Decimal::ZERO);
    }

    #[test]
    fn test_order_response_parse() {
        let response: OrderResponse =
            serde_json::from_str(r#"{"orderId":"abc123","status":"FILLED"}"#).unwrap();
        assert_eq!(response.order_id, "abc123");
        assert_eq!(response.status, "FILLED");
        assert!(response.message.is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = ExchangeClientConfig::default();
        assert_eq!(config.timeout_ms, 10_000);
        assert!(config.base_url.starts_with("https://"));
    }
}
