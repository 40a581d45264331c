//! In-memory stub gateway for behavior tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use perpctl_core::{Instrument, Price, Size};
use perpctl_gateway::{
    AccountGateway, GatewayError, GatewayResult, MarketDataGateway, OrderAck, OrderGateway,
    OrderRequest,
};
use rust_decimal::Decimal;

/// Stub implementing all three gateway contracts with scripted responses
/// and a recorded order log.
pub(crate) struct StubGateway {
    price: Mutex<Decimal>,
    balance: Mutex<Decimal>,
    live_size: Mutex<Decimal>,
    orders: Mutex<Vec<OrderRequest>>,
    next_price_error: Mutex<Option<GatewayError>>,
    next_order_error: Mutex<Option<GatewayError>>,
}

impl StubGateway {
    pub fn new(price: Decimal, balance: Decimal, live_size: Decimal) -> Self {
        Self {
            price: Mutex::new(price),
            balance: Mutex::new(balance),
            live_size: Mutex::new(live_size),
            orders: Mutex::new(Vec::new()),
            next_price_error: Mutex::new(None),
            next_order_error: Mutex::new(None),
        }
    }

    pub fn set_price(&self, price: Decimal) {
        *self.price.lock() = price;
    }

    pub fn set_live_size(&self, size: Decimal) {
        *self.live_size.lock() = size;
    }

    pub fn fail_next_price(&self, error: GatewayError) {
        *self.next_price_error.lock() = Some(error);
    }

    pub fn fail_next_order(&self, error: GatewayError) {
        *self.next_order_error.lock() = Some(error);
    }

    pub fn orders(&self) -> Vec<OrderRequest> {
        self.orders.lock().clone()
    }
}

#[async_trait]
impl MarketDataGateway for StubGateway {
    async fn mark_price(&self, _instrument: &Instrument) -> GatewayResult<Price> {
        if let Some(error) = self.next_price_error.lock().take() {
            return Err(error);
        }
        Ok(Price::new(*self.price.lock()))
    }
}

#[async_trait]
impl AccountGateway for StubGateway {
    async fn available_balance(&self) -> GatewayResult<Decimal> {
        Ok(*self.balance.lock())
    }

    async fn live_position_size(&self, _instrument: &Instrument) -> GatewayResult<Size> {
        Ok(Size::new(*self.live_size.lock()))
    }
}

#[async_trait]
impl OrderGateway for StubGateway {
    async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderAck> {
        if let Some(error) = self.next_order_error.lock().take() {
            return Err(error);
        }
        self.orders.lock().push(order.clone());
        Ok(OrderAck {
            order_id: format!("stub-{}", self.orders.lock().len()),
            status: "FILLED".to_string(),
        })
    }
}
