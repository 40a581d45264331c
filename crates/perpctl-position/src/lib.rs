//! Position lifecycle state and risk monitoring.
//!
//! This crate owns the system's one piece of real shared mutable state:
//! the single-slot position record, written by both the webhook signal
//! handler and the background risk monitor loop. It also provides the
//! signed P&L computation and the live-size flatten helper both writers
//! share.

pub mod book;
pub mod flatten;
pub mod monitor;
pub mod pnl;

pub use book::{Position, PositionBook, PositionBookHandle};
pub use flatten::{flatten_live, FlattenOutcome};
pub use monitor::{ExitTrigger, MonitorConfig, RiskMonitor};
pub use pnl::pnl_pct;

#[cfg(test)]
pub(crate) mod testutil;
