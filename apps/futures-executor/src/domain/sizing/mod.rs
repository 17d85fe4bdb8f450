//! Order sizing: USDT notional to exchange-legal quantity, and LIMIT pricing.
//!
//! All arithmetic is decimal and rounds toward zero.
//!
//! # Example
//!
//! ```rust,ignore
//! use futures_executor::domain::sizing::QuantityCalculator;
//! use rust_decimal_macros::dec;
//!
//! let result = QuantityCalculator::new().compute_quantity(dec!(200), dec!(67398.54), &rules)?;
//! assert_eq!(result.quantity, dec!(0.002));
//! ```

mod calculator;
mod error;
mod limit_price;

pub use calculator::{QuantityCalculator, QuantityComputation};
pub use error::SizingError;
pub use limit_price::{LIMIT_PRICE_OFFSET, LimitPricer};
