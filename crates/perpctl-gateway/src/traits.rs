//! Gateway trait contracts consumed by the controller.
//!
//! The signal handler and risk monitor depend on these contracts, not on
//! the concrete REST client, so behavior tests can run against in-memory
//! stubs.

use crate::error::GatewayResult;
use async_trait::async_trait;
use perpctl_core::{Instrument, OrderSide, Price, Size};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A market order to submit to the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    pub instrument: Instrument,
    pub side: OrderSide,
    pub quantity: Size,
    /// Reduce-only orders can only decrease an existing position,
    /// never open or increase one in the opposite direction.
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Entry order: opens or increases exposure.
    pub fn entry(instrument: Instrument, side: OrderSide, quantity: Size) -> Self {
        Self {
            instrument,
            side,
            quantity,
            reduce_only: false,
        }
    }

    /// Exit order: reduce-only close.
    pub fn exit(instrument: Instrument, side: OrderSide, quantity: Size) -> Self {
        Self {
            instrument,
            side,
            quantity,
            reduce_only: true,
        }
    }
}

/// Confirmation returned by the exchange for an accepted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: String,
}

/// Current mark/last price for the configured instrument.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    async fn mark_price(&self, instrument: &Instrument) -> GatewayResult<Price>;
}

/// Account equity and live position size at the exchange.
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Available balance in the margin currency.
    async fn available_balance(&self) -> GatewayResult<Decimal>;

    /// Quantity currently held at the exchange for the instrument.
    /// Zero when flat. This is the authoritative size for exits; the
    /// locally cached position size is never used to close.
    async fn live_position_size(&self, instrument: &Instrument) -> GatewayResult<Size>;
}

/// Order submission.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderAck>;
}
