//! Single-slot position record shared between the signal handler and
//! the risk monitor loop.
//!
//! The record moves between exactly two states: EMPTY (no position,
//! initial and terminal) and OPEN (one coherent position). Partial
//! states are never observable: the lock is taken only for a full-record
//! snapshot read or a full-record replace, never across a network call.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use perpctl_core::{Direction, Instrument, Price, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The currently-held position.
///
/// Existence of a `Position` value means the slot is OPEN; `size` is
/// always positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub instrument: Instrument,
    pub direction: Direction,
    pub entry_price: Price,
    /// Opening timestamp, for diagnostics only; never used in P&L decisions.
    pub entry_time: DateTime<Utc>,
    pub size: Size,
}

impl Position {
    pub fn new(
        instrument: Instrument,
        direction: Direction,
        entry_price: Price,
        size: Size,
    ) -> Self {
        Self {
            instrument,
            direction,
            entry_price,
            entry_time: Utc::now(),
            size,
        }
    }
}

/// Lock-guarded single position slot.
///
/// Both the signal handler and the monitor loop hold a
/// `PositionBookHandle` and may write; neither ever sees a half-written
/// record.
#[derive(Debug, Default)]
pub struct PositionBook {
    slot: Mutex<Option<Position>>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current position, or None when flat.
    pub fn get(&self) -> Option<Position> {
        self.slot.lock().clone()
    }

    /// Atomically replace the full record.
    pub fn set(&self, position: Position) {
        *self.slot.lock() = Some(position);
    }

    /// Atomically reset to the empty state. Idempotent.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }

    pub fn is_open(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Thread-safe handle shared between the handler and the monitor loop.
pub type PositionBookHandle = Arc<PositionBook>;
