//! Inbound trade-signal surface.
//!
//! Receives webhook signals, validates them, sizes and places entry
//! orders, and exposes the axum HTTP endpoint. Shares the position book
//! with the risk monitor loop; never calls into it.

pub mod error;
pub mod handler;
pub mod server;
pub mod signal;

pub use error::{HandlerError, HandlerResult};
pub use handler::{compute_entry_size, EntryReport, SignalHandler, SizingConfig};
pub use server::{create_router, run_server, AppState, ServerConfig};
pub use signal::{TradeSignal, ValidSignal};
