//! Binance USDⓈ-M Futures Gateway
//!
//! Implementation of `ExchangeGateway` for the Binance futures REST API with:
//! - HMAC-SHA256 request signing
//! - Retry with exponential backoff and jitter for idempotent requests only
//! - Order submissions sent once, with timeouts reported as unknown outcomes
//! - TESTNET and MAINNET environments

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;
mod signer;

pub use adapter::BinanceGateway;
pub use config::{BinanceConfig, BinanceEnvironment, RetryConfig};
pub use error::BinanceError;
