//! Signed REST gateways to the exchange.
//!
//! Provides the three gateway contracts the controller consumes
//! (market data, account, orders), a single consolidated request
//! signer, and the `ExchangeClient` implementing all three over the
//! exchange REST API.

pub mod client;
pub mod error;
pub mod signer;
pub mod traits;

pub use client::{ExchangeClient, ExchangeClientConfig};
pub use error::{GatewayError, GatewayResult};
pub use signer::RequestSigner;
pub use traits::{AccountGateway, MarketDataGateway, OrderAck, OrderGateway, OrderRequest};
