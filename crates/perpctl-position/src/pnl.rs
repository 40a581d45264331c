//! Signed unrealized P&L computation.

use perpctl_core::{Direction, Price};
use rust_decimal::Decimal;

/// Percentage unrealized gain/loss relative to entry price,
/// sign-adjusted for position direction.
///
/// - Long: `(mark - entry) / entry * 100`
/// - Short: `(entry - mark) / entry * 100`
///
/// Returns None when the entry price is zero.
pub fn pnl_pct(direction: Direction, entry_price: Price, mark_price: Price) -> Option<Decimal> {
    let raw = mark_price.pct_from(entry_price)?;
    Some(match direction {
        Direction::Long => raw,
        Direction::Short => -raw,
    })
}
