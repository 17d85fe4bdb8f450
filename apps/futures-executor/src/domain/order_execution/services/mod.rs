//! Order execution domain services.

mod order_validator;

pub use order_validator::OrderValidator;
