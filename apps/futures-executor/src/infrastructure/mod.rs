//! Infrastructure Layer
//!
//! Adapters (implementations) for the ports defined in the application
//! layer. Following hexagonal architecture:
//!
//! - **Driven Adapters (Outbound)**: Implement `ExchangeGateway`
//!   - `exchange::binance`: Binance USDⓈ-M futures REST API
//!   - `exchange`: In-memory simulated exchange, symbol rules cache
//!
//! The binary (`main.rs`) is the only driver: it loads settings and runs
//! one workflow.

pub mod exchange;
