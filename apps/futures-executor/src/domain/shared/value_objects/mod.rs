//! Shared Value Objects
//!
//! Immutable domain types used across bounded contexts.
//! Value objects are compared by value, not identity.

mod identifiers;
mod leverage;
mod symbol;

pub use identifiers::{ClientOrderId, ExchangeOrderId, MAX_CLIENT_ORDER_ID_LEN};
pub use leverage::Leverage;
pub use symbol::Symbol;
