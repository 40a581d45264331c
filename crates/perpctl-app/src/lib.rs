//! perpctl — single-position perpetual futures trading controller.
//!
//! Wires the webhook signal surface, the exchange gateways, and the
//! risk monitor loop around one shared position book.

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{ApiCredentials, AppConfig};
pub use error::{AppError, AppResult};
