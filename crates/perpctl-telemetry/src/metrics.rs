//! Prometheus metrics for the trading controller.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()` intentionally. A registration
//! failure means a duplicate metric name, a fatal configuration error
//! that should crash at startup rather than fail silently. These panics
//! only occur during static initialization, never at runtime.

use once_cell::sync::Lazy;
use prometheus::{register_counter_vec, register_int_gauge, CounterVec, IntGauge};

/// Total inbound signals by direction and outcome
/// (accepted/invalid/market_data_unavailable/order_rejected/exit_failed).
pub static SIGNALS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "perpctl_signals_total",
        "Total inbound webhook signals",
        &["direction", "outcome"]
    )
    .unwrap()
});

/// Total entry orders confirmed, by direction.
pub static ENTRIES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "perpctl_entries_total",
        "Total confirmed entry orders",
        &["direction"]
    )
    .unwrap()
});

/// Total confirmed exits by trigger
/// (signal/take_profit/stop_loss/external).
pub static EXITS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "perpctl_exits_total",
        "Total confirmed position exits",
        &["trigger"]
    )
    .unwrap()
});

/// Total failed exit attempts (retried on the next monitor iteration).
pub static EXIT_FAILURES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "perpctl_exit_failures_total",
        "Total failed reduce-only exit attempts",
        &["component"]
    )
    .unwrap()
});

/// Whether a position is currently open (1) or the slot is empty (0).
pub static POSITION_OPEN: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "perpctl_position_open",
        "Position slot state (1=open, 0=empty)"
    )
    .unwrap()
});

/// Facade of static helpers, called from the handler and monitor paths.
pub struct Metrics;

impl Metrics {
    /// Record an inbound signal and its handling outcome.
    pub fn signal_handled(direction: &str, outcome: &str) {
        SIGNALS_TOTAL.with_label_values(&[direction, outcome]).inc();
    }

    /// Record a confirmed entry.
    pub fn entry_recorded(direction: &str) {
        ENTRIES_TOTAL.with_label_values(&[direction]).inc();
    }

    /// Record a confirmed exit.
    pub fn exit_recorded(trigger: &str) {
        EXITS_TOTAL.with_label_values(&[trigger]).inc();
    }

    /// Record a failed exit attempt from the monitor loop.
    pub fn exit_failed() {
        EXIT_FAILURES_TOTAL.with_label_values(&["monitor"]).inc();
    }

    /// Mark the position slot open.
    pub fn position_opened() {
        POSITION_OPEN.set(1);
    }

    /// Mark the position slot empty.
    pub fn position_closed() {
        POSITION_OPEN.set(0);
    }
}
