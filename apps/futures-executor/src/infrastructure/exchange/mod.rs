//! Exchange Adapters
//!
//! Implementations of `ExchangeGateway`:
//! - `binance`: Binance USDⓈ-M futures REST API (TESTNET or MAINNET)
//! - `simulated`: in-memory exchange for dry runs and tests
//! - `caching`: symbol rules cache wrapping either of the above

pub mod binance;
mod caching;
mod simulated;

pub use binance::{BinanceConfig, BinanceEnvironment, BinanceError, BinanceGateway, RetryConfig};
pub use caching::CachingGateway;
pub use simulated::{
    DEFAULT_MAX_LEVERAGE, SimOperation, SimulatedExchange, btcusdt_rules, ethusdt_rules,
};
