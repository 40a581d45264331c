//! Core domain types for the perpctl trading controller.
//!
//! This crate provides the fundamental types used throughout the system:
//! - `Price`, `Size`: precision-safe numeric types
//! - `Instrument`: identifier of the traded contract
//! - `Direction`, `OrderSide`: trading enums

pub mod decimal;
pub mod error;
pub mod instrument;
pub mod order;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use instrument::Instrument;
pub use order::{Direction, OrderSide};
