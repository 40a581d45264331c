//! Position flattening via reduce-only orders.
//!
//! Shared by the signal handler (unconditional pre-entry flatten) and the
//! risk monitor (take-profit/stop-loss exit). The quantity to close is
//! always re-derived from the live exchange position, never from the
//! locally cached record, so a spurious or externally-modified position
//! is flattened in full.

use perpctl_core::{Instrument, OrderSide, Size};
use perpctl_gateway::{AccountGateway, GatewayResult, OrderGateway, OrderRequest};
use tracing::{debug, info};

/// Result of a flatten attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlattenOutcome {
    /// Live exchange size was zero or negative; no order was placed.
    NothingToClose,
    /// A reduce-only order for the full live size was accepted.
    Closed { size: Size },
}

/// Close whatever the exchange currently holds for `instrument`.
///
/// Queries the live position size first; a size of zero or less is a
/// no-op, not an error. Otherwise submits a reduce-only market order
/// on `exit_side` for the full live quantity.
pub async fn flatten_live<G>(
    gateway: &G,
    instrument: &Instrument,
    exit_side: OrderSide,
) -> GatewayResult<FlattenOutcome>
where
    G: AccountGateway + OrderGateway + ?Sized,
{
    let live_size = gateway.live_position_size(instrument).await?;
    if !live_size.is_positive() {
        debug!(%instrument, %live_size, "Nothing to flatten");
        return Ok(FlattenOutcome::NothingToClose);
    }

    let order = OrderRequest::exit(instrument.clone(), exit_side, live_size);
    let ack = gateway.submit_order(&order).await?;

    info!(
        %instrument,
        side = %exit_side,
        size = %live_size,
        order_id = %ack.order_id,
        "Position flattened"
    );

    Ok(FlattenOutcome::Closed { size: live_size })
}
