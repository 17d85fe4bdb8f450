//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.

mod exchange_gateway;

#[cfg(test)]
pub use exchange_gateway::MockExchangeGateway;
pub use exchange_gateway::{ExchangeGateway, GatewayError, LeverageAck};
