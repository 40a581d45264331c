//! Take-profit/stop-loss risk monitor loop.
//!
//! A single long-lived background task that polls the mark price on a
//! fixed interval, computes unrealized P&L against the position book,
//! and flattens the position when a threshold is crossed. Transient
//! data errors skip the iteration; a failed exit is retried on the next
//! tick until the position is confirmed flat (at-least-once policy).

use crate::book::PositionBookHandle;
use crate::flatten::{flatten_live, FlattenOutcome};
use crate::pnl::pnl_pct;
use perpctl_core::{Direction, Instrument};
use perpctl_gateway::{AccountGateway, MarketDataGateway, OrderGateway};
use perpctl_telemetry::Metrics;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, trace, warn};

/// Risk monitor configuration.
///
/// Take-profit and stop-loss thresholds are separately named per
/// direction; the two directions deliberately carry asymmetric risk
/// tolerance rather than one shared magnitude.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Take-profit threshold for longs (P&L %, positive). Default: 1.0.
    #[serde(default = "default_take_profit_long_pct")]
    pub take_profit_long_pct: Decimal,
    /// Stop-loss threshold for longs (P&L %, negative). Default: -0.5.
    #[serde(default = "default_stop_loss_long_pct")]
    pub stop_loss_long_pct: Decimal,
    /// Take-profit threshold for shorts (P&L %, positive). Default: 0.8.
    #[serde(default = "default_take_profit_short_pct")]
    pub take_profit_short_pct: Decimal,
    /// Stop-loss threshold for shorts (P&L %, negative). Default: -0.4.
    #[serde(default = "default_stop_loss_short_pct")]
    pub stop_loss_short_pct: Decimal,
    /// Poll interval (ms). Default: 4,000.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_take_profit_long_pct() -> Decimal {
    Decimal::new(10, 1) // 1.0
}

fn default_stop_loss_long_pct() -> Decimal {
    Decimal::new(-5, 1) // -0.5
}

fn default_take_profit_short_pct() -> Decimal {
    Decimal::new(8, 1) // 0.8
}

fn default_stop_loss_short_pct() -> Decimal {
    Decimal::new(-4, 1) // -0.4
}

fn default_poll_interval_ms() -> u64 {
    4_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            take_profit_long_pct: default_take_profit_long_pct(),
            stop_loss_long_pct: default_stop_loss_long_pct(),
            take_profit_short_pct: default_take_profit_short_pct(),
            stop_loss_short_pct: default_stop_loss_short_pct(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl MonitorConfig {
    /// Which threshold, if any, the given P&L% crosses for a direction.
    ///
    /// Take-profit triggers at `pnl >= threshold`, stop-loss at
    /// `pnl <= threshold`.
    pub fn breach(&self, direction: Direction, pnl: Decimal) -> Option<ExitTrigger> {
        let (take_profit, stop_loss) = match direction {
            Direction::Long => (self.take_profit_long_pct, self.stop_loss_long_pct),
            Direction::Short => (self.take_profit_short_pct, self.stop_loss_short_pct),
        };

        if pnl >= take_profit {
            Some(ExitTrigger::TakeProfit)
        } else if pnl <= stop_loss {
            Some(ExitTrigger::StopLoss)
        } else {
            None
        }
    }
}

/// Which threshold triggered an automatic exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitTrigger {
    TakeProfit,
    StopLoss,
}

impl fmt::Display for ExitTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TakeProfit => write!(f, "take_profit"),
            Self::StopLoss => write!(f, "stop_loss"),
        }
    }
}

/// Background P&L monitor for the single position slot.
///
/// Communicates with the signal handler only through the position book;
/// neither path ever calls into the other.
pub struct RiskMonitor<G> {
    config: MonitorConfig,
    instrument: Instrument,
    book: PositionBookHandle,
    gateway: Arc<G>,
}

impl<G> RiskMonitor<G>
where
    G: MarketDataGateway + AccountGateway + OrderGateway,
{
    pub fn new(
        config: MonitorConfig,
        instrument: Instrument,
        book: PositionBookHandle,
        gateway: Arc<G>,
    ) -> Self {
        info!(
            instrument = %instrument,
            take_profit_long_pct = %config.take_profit_long_pct,
            stop_loss_long_pct = %config.stop_loss_long_pct,
            take_profit_short_pct = %config.take_profit_short_pct,
            stop_loss_short_pct = %config.stop_loss_short_pct,
            poll_interval_ms = config.poll_interval_ms,
            "Risk monitor initialized"
        );

        Self {
            config,
            instrument,
            book,
            gateway,
        }
    }

    /// Run the perpetual monitoring loop. Never returns; no individual
    /// call failure is fatal.
    pub async fn run(self) {
        let mut interval =
            tokio::time::interval(Duration::from_millis(self.config.poll_interval_ms));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// One monitor iteration. Public so tests can drive the loop
    /// deterministically.
    pub async fn tick(&self) {
        let Some(position) = self.book.get() else {
            trace!("No open position, idle");
            return;
        };

        let price = match self.gateway.mark_price(&self.instrument).await {
            Ok(price) => price,
            Err(error) => {
                warn!(%error, "Mark price unavailable, skipping iteration");
                return;
            }
        };

        let Some(pnl) = pnl_pct(position.direction, position.entry_price, price) else {
            warn!(entry_price = %position.entry_price, "Unusable entry price, skipping iteration");
            return;
        };

        let Some(trigger) = self.config.breach(position.direction, pnl) else {
            trace!(%pnl, direction = %position.direction, "Within thresholds");
            return;
        };

        info!(
            instrument = %self.instrument,
            direction = %position.direction,
            entry_price = %position.entry_price,
            mark_price = %price,
            pnl_pct = %pnl,
            trigger = %trigger,
            "Threshold breached, flattening position"
        );

        match flatten_live(
            self.gateway.as_ref(),
            &self.instrument,
            position.direction.exit_side(),
        )
        .await
        {
            Ok(FlattenOutcome::Closed { size }) => {
                self.book.clear();
                Metrics::exit_recorded(&trigger.to_string());
                Metrics::position_closed();
                info!(%size, trigger = %trigger, "Position closed, state cleared");
            }
            Ok(FlattenOutcome::NothingToClose) => {
                // Closed out from under us at the exchange; the local
                // record is stale and monitoring it would retry forever.
                self.book.clear();
                Metrics::exit_recorded("external");
                Metrics::position_closed();
                warn!("Live position already flat, cleared stale record");
            }
            Err(error) => {
                // Position stays at risk; retried next tick.
                Metrics::exit_failed();
                warn!(%error, trigger = %trigger, "Exit failed, will retry next iteration");
            }
        }
    }
}
