//! Order Execution Bounded Context
//!
//! Order requests, exchange order responses and the local validation that
//! runs before anything is sent.

pub mod errors;
pub mod order;
pub mod services;
pub mod value_objects;

pub use errors::OrderError;
pub use order::{OrderRequest, OrderResponse};
pub use services::OrderValidator;
pub use value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce};
