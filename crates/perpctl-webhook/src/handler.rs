//! Entry/exit decision logic for inbound signals.
//!
//! Every entry signal is "go to this side": the handler first flattens
//! any opposing position at the exchange, then sizes and places the
//! entry order, and only commits the position record after the exchange
//! confirms. The position book lock is never held across a network call.

use crate::error::{HandlerError, HandlerResult};
use crate::signal::{TradeSignal, ValidSignal};
use perpctl_core::{Direction, Instrument, Price, Size};
use perpctl_gateway::{
    AccountGateway, GatewayError, MarketDataGateway, OrderGateway, OrderRequest,
};
use perpctl_position::{flatten_live, FlattenOutcome, Position, PositionBookHandle};
use perpctl_telemetry::Metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Position sizing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Fraction of available equity committed per entry. Default: 0.16.
    #[serde(default = "default_risk_fraction")]
    pub risk_fraction: Decimal,
    /// Leverage multiplier applied to the committed equity. Default: 6.
    #[serde(default = "default_leverage")]
    pub leverage: Decimal,
    /// Minimum order quantity; tiny accounts still place a valid order.
    /// Default: 1.
    #[serde(default = "default_min_quantity")]
    pub min_quantity: Decimal,
    /// Minimum order notional (quantity * price). Default: 0 (disabled).
    #[serde(default)]
    pub min_notional: Decimal,
}

fn default_risk_fraction() -> Decimal {
    Decimal::new(16, 2) // 0.16
}

fn default_leverage() -> Decimal {
    Decimal::from(6)
}

fn default_min_quantity() -> Decimal {
    Decimal::ONE
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            risk_fraction: default_risk_fraction(),
            leverage: default_leverage(),
            min_quantity: default_min_quantity(),
            min_notional: Decimal::ZERO,
        }
    }
}

/// Compute the entry order quantity:
/// `max(floor(equity * risk_fraction * leverage * strength / price), min_quantity)`,
/// raised further if the resulting notional is below `min_notional`.
pub fn compute_entry_size(
    equity: Decimal,
    price: Price,
    strength: Decimal,
    config: &SizingConfig,
) -> Size {
    let raw = (equity * config.risk_fraction * config.leverage * strength / price.inner()).floor();
    let mut quantity = raw.max(config.min_quantity);

    if quantity * price.inner() < config.min_notional {
        quantity = quantity.max((config.min_notional / price.inner()).ceil());
    }

    Size::new(quantity)
}

/// Confirmed entry, reported back to the webhook caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    pub side: Direction,
    pub qty: Size,
}

/// Translates validated signals into sized orders and position state.
pub struct SignalHandler<G> {
    instrument: Instrument,
    sizing: SizingConfig,
    book: PositionBookHandle,
    gateway: Arc<G>,
}

impl<G> SignalHandler<G>
where
    G: MarketDataGateway + AccountGateway + OrderGateway,
{
    pub fn new(
        instrument: Instrument,
        sizing: SizingConfig,
        book: PositionBookHandle,
        gateway: Arc<G>,
    ) -> Self {
        Self {
            instrument,
            sizing,
            book,
            gateway,
        }
    }

    /// Handle one inbound signal end to end.
    pub async fn handle(&self, signal: TradeSignal) -> HandlerResult<EntryReport> {
        let direction_label = signal.position.parse::<Direction>().map_or("unknown", |d| {
            match d {
                Direction::Long => "long",
                Direction::Short => "short",
            }
        });

        let result = self.handle_inner(&signal).await;
        match &result {
            Ok(report) => {
                Metrics::signal_handled(direction_label, "accepted");
                Metrics::entry_recorded(&report.side.to_string());
            }
            Err(error) => {
                Metrics::signal_handled(direction_label, error.outcome());
            }
        }
        result
    }

    async fn handle_inner(&self, signal: &TradeSignal) -> HandlerResult<EntryReport> {
        let ValidSignal {
            direction,
            strength,
        } = signal.validate()?;

        // 1. Unconditionally flatten any opposing position. The close
        // quantity comes from the live exchange size, so a stale or
        // externally-modified position is flattened in full; nothing
        // open is a no-op.
        let flattened = flatten_live(
            self.gateway.as_ref(),
            &self.instrument,
            direction.opposite().exit_side(),
        )
        .await
        .map_err(|error| {
            warn!(%error, "Pre-entry flatten failed, entry aborted");
            HandlerError::ExitFailed(error)
        })?;

        // The old position is gone at the exchange; drop the record now
        // so a failure later in this handler cannot leave a stale OPEN
        // state behind.
        if let FlattenOutcome::Closed { size } = flattened {
            self.book.clear();
            Metrics::exit_recorded("signal");
            Metrics::position_closed();
            info!(%size, "Opposing position closed on entry signal");
        }

        // 2. Equity and price; either unavailable means no entry order.
        let equity = self
            .gateway
            .available_balance()
            .await
            .map_err(HandlerError::MarketDataUnavailable)?;
        if equity <= Decimal::ZERO {
            return Err(HandlerError::MarketDataUnavailable(
                GatewayError::Unavailable(format!("non-positive equity {equity}")),
            ));
        }

        let price = self
            .gateway
            .mark_price(&self.instrument)
            .await
            .map_err(HandlerError::MarketDataUnavailable)?;
        if !price.is_positive() {
            return Err(HandlerError::MarketDataUnavailable(
                GatewayError::Unavailable(format!("non-positive mark price {price}")),
            ));
        }

        // 3. Size the order.
        let quantity = compute_entry_size(equity, price, strength, &self.sizing);

        // 4. Submit the entry. Failures are surfaced, never retried,
        // to avoid duplicate fills.
        let order = OrderRequest::entry(self.instrument.clone(), direction.entry_side(), quantity);
        let ack = self
            .gateway
            .submit_order(&order)
            .await
            .map_err(|error| match error {
                GatewayError::Rejected { status, message } => {
                    HandlerError::OrderRejected { status, message }
                }
                other => HandlerError::Gateway(other),
            })?;

        // 5. Commit the new position only after confirmation.
        self.book.set(Position::new(
            self.instrument.clone(),
            direction,
            price,
            quantity,
        ));
        Metrics::position_opened();

        info!(
            instrument = %self.instrument,
            %direction,
            entry_price = %price,
            %quantity,
            %strength,
            order_id = %ack.order_id,
            "Entry confirmed, position recorded"
        );

        Ok(EntryReport {
            side: direction,
            qty: quantity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use perpctl_core::OrderSide;
    use perpctl_gateway::{GatewayResult, OrderAck};
    use perpctl_position::PositionBook;
    use rust_decimal_macros::dec;

    struct StubGateway {
        price: Mutex<Decimal>,
        balance: Mutex<Decimal>,
        live_size: Mutex<Decimal>,
        orders: Mutex<Vec<OrderRequest>>,
        next_price_error: Mutex<Option<GatewayError>>,
        next_order_error: Mutex<Option<GatewayError>>,
        calls: Mutex<u32>,
    }

    impl StubGateway {
        fn new(price: Decimal, balance: Decimal, live_size: Decimal) -> Self {
            Self {
                price: Mutex::new(price),
                balance: Mutex::new(balance),
                live_size: Mutex::new(live_size),
                orders: Mutex::new(Vec::new()),
                next_price_error: Mutex::new(None),
                next_order_error: Mutex::new(None),
                calls: Mutex::new(0),
            }
        }

        fn orders(&self) -> Vec<OrderRequest> {
            self.orders.lock().clone()
        }

        fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl MarketDataGateway for StubGateway {
        async fn mark_price(&self, _instrument: &Instrument) -> GatewayResult<Price> {
            *self.calls.lock() += 1;
            if let Some(error) = self.next_price_error.lock().take() {
                return Err(error);
            }
            Ok(Price::new(*self.price.lock()))
        }
    }

    #[async_trait]
    impl AccountGateway for StubGateway {
        async fn available_balance(&self) -> GatewayResult<Decimal> {
            *self.calls.lock() += 1;
            Ok(*self.balance.lock())
        }

        async fn live_position_size(&self, _instrument: &Instrument) -> GatewayResult<Size> {
            *self.calls.lock() += 1;
            Ok(Size::new(*self.live_size.lock()))
        }
    }

    #[async_trait]
    impl OrderGateway for StubGateway {
        async fn submit_order(&self, order: &OrderRequest) -> GatewayResult<OrderAck> {
            *self.calls.lock() += 1;
            if let Some(error) = self.next_order_error.lock().take() {
                return Err(error);
            }
            self.orders.lock().push(order.clone());
            Ok(OrderAck {
                order_id: "stub-1".to_string(),
                status: "FILLED".to_string(),
            })
        }
    }

    fn instrument() -> Instrument {
        Instrument::new("BTC-USDT-PERP").unwrap()
    }

    fn entry_signal(position: &str, strength: Option<Decimal>) -> TradeSignal {
        TradeSignal {
            signal: "entry".to_string(),
            position: position.to_string(),
            strength,
        }
    }

    fn handler(
        gateway: Arc<StubGateway>,
        book: PositionBookHandle,
    ) -> SignalHandler<StubGateway> {
        SignalHandler::new(instrument(), SizingConfig::default(), book, gateway)
    }

    #[test]
    fn test_compute_entry_size_formula() {
        // equity=1000, risk=0.16, leverage=6, strength=1, price=100
        // floor(1000*0.16*6*1/100) = floor(9.6) = 9
        let size = compute_entry_size(
            dec!(1000),
            Price::new(dec!(100)),
            dec!(1.0),
            &SizingConfig::default(),
        );
        assert_eq!(size, Size::new(dec!(9)));
    }

    #[test]
    fn test_compute_entry_size_floors_to_min_quantity() {
        // floor(10*0.16*6/100) = 0 -> min_quantity 1
        let size = compute_entry_size(
            dec!(10),
            Price::new(dec!(100)),
            dec!(1.0),
            &SizingConfig::default(),
        );
        assert_eq!(size, Size::new(dec!(1)));
    }

    #[test]
    fn test_compute_entry_size_scales_with_strength() {
        let size = compute_entry_size(
            dec!(1000),
            Price::new(dec!(100)),
            dec!(2.0),
            &SizingConfig::default(),
        );
        assert_eq!(size, Size::new(dec!(19))); // floor(19.2)
    }

    #[test]
    fn test_compute_entry_size_min_notional_bump() {
        let config = SizingConfig {
            min_notional: dec!(500),
            ..SizingConfig::default()
        };
        // floor(100*0.16*6/100) = 0 -> min_qty 1 -> notional 100 < 500
        // -> ceil(500/100) = 5
        let size = compute_entry_size(dec!(100), Price::new(dec!(100)), dec!(1.0), &config);
        assert_eq!(size, Size::new(dec!(5)));
    }

    #[tokio::test]
    async fn test_long_entry_flattens_opposite_then_buys() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        // A short of 4 is live at the exchange.
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(4)));

        let report = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", Some(dec!(1.0))))
            .await
            .unwrap();

        assert_eq!(report.side, Direction::Long);
        assert_eq!(report.qty, Size::new(dec!(9)));

        let orders = gateway.orders();
        assert_eq!(orders.len(), 2);
        // Flatten of the opposing short: reduce-only buy of the live size.
        assert_eq!(orders[0].side, OrderSide::Buy);
        assert_eq!(orders[0].quantity, Size::new(dec!(4)));
        assert!(orders[0].reduce_only);
        // Entry: buy 9 at market.
        assert_eq!(orders[1].side, OrderSide::Buy);
        assert_eq!(orders[1].quantity, Size::new(dec!(9)));
        assert!(!orders[1].reduce_only);

        let position = book.get().unwrap();
        assert_eq!(position.direction, Direction::Long);
        assert_eq!(position.entry_price, Price::new(dec!(100)));
        assert_eq!(position.size, Size::new(dec!(9)));
    }

    #[tokio::test]
    async fn test_short_entry_uses_sell_side() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(0)));

        let report = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("short", None))
            .await
            .unwrap();

        assert_eq!(report.side, Direction::Short);

        // Nothing was live, so the only order is the entry sell.
        let orders = gateway.orders();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].side, OrderSide::Sell);
        assert!(!orders[0].reduce_only);
        assert_eq!(book.get().unwrap().direction, Direction::Short);
    }

    #[tokio::test]
    async fn test_invalid_signal_makes_no_gateway_calls() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(0)));

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("flat", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::InvalidSignal(_)));
        assert_eq!(gateway.calls(), 0);
        assert!(book.get().is_none());
    }

    #[tokio::test]
    async fn test_market_data_failure_places_no_order() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(0)));
        gateway
            .next_price_error
            .lock()
            .replace(GatewayError::Unavailable("ticker down".to_string()));

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::MarketDataUnavailable(_)));
        assert!(gateway.orders().is_empty());
        assert!(book.get().is_none());
    }

    #[tokio::test]
    async fn test_zero_price_is_market_data_unavailable() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(0), dec!(1000), dec!(0)));

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::MarketDataUnavailable(_)));
        assert!(gateway.orders().is_empty());
        assert!(book.get().is_none());
    }

    #[tokio::test]
    async fn test_confirmed_flatten_clears_book_even_if_entry_fails() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        book.set(Position::new(
            instrument(),
            Direction::Short,
            Price::new(dec!(100)),
            Size::new(dec!(4)),
        ));

        // The opposing short is live, but the price fetch after the
        // flatten fails, so no entry happens.
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(4)));
        gateway
            .next_price_error
            .lock()
            .replace(GatewayError::Unavailable("ticker down".to_string()));

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::MarketDataUnavailable(_)));

        // The flatten was confirmed at the exchange...
        let orders = gateway.orders();
        assert_eq!(orders.len(), 1);
        assert!(orders[0].reduce_only);
        // ...so the stale short record must be gone.
        assert!(book.get().is_none());
    }

    #[tokio::test]
    async fn test_zero_equity_is_market_data_unavailable() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(0), dec!(0)));

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::MarketDataUnavailable(_)));
        assert!(gateway.orders().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_entry_leaves_book_untouched() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(0)));
        gateway.next_order_error.lock().replace(GatewayError::Rejected {
            status: "REJECTED".to_string(),
            message: "insufficient margin".to_string(),
        });

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::OrderRejected { .. }));
        assert!(book.get().is_none());
    }

    #[tokio::test]
    async fn test_failed_flatten_aborts_entry() {
        let book: PositionBookHandle = Arc::new(PositionBook::new());
        // Live opposing position, but the flatten order fails.
        let gateway = Arc::new(StubGateway::new(dec!(100), dec!(1000), dec!(4)));
        gateway.next_order_error.lock().replace(GatewayError::Rejected {
            status: "REJECTED".to_string(),
            message: "throttled".to_string(),
        });

        let error = handler(Arc::clone(&gateway), Arc::clone(&book))
            .handle(entry_signal("long", None))
            .await
            .unwrap_err();

        assert!(matches!(error, HandlerError::ExitFailed(_)));
        assert!(gateway.orders().is_empty());
        assert!(book.get().is_none());
    }
}
