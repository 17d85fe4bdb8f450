//! Order validation errors.

use rust_decimal::Decimal;
use std::fmt;

use super::value_objects::OrderType;

/// Errors raised when an order request breaks the symbol's trading rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    /// Request symbol differs from the rules snapshot's symbol.
    SymbolMismatch {
        /// Symbol the rules were fetched for.
        expected: String,
        /// Symbol on the request.
        actual: String,
    },

    /// Quantity violates bounds, step grid or precision.
    InvalidQuantity {
        /// Offending quantity.
        quantity: Decimal,
        /// Which rule was broken.
        reason: String,
    },

    /// Price violates bounds, tick grid or precision.
    InvalidPrice {
        /// Offending price, if one was supplied.
        price: Option<Decimal>,
        /// Which rule was broken.
        reason: String,
    },

    /// Order type cannot be placed by the position opener.
    UnsupportedOrderType(OrderType),
}

impl fmt::Display for OrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SymbolMismatch { expected, actual } => {
                write!(f, "Order symbol {actual} does not match rules for {expected}")
            }
            Self::InvalidQuantity { quantity, reason } => {
                write!(f, "Invalid quantity {quantity}: {reason}")
            }
            Self::InvalidPrice {
                price: Some(price),
                reason,
            } => write!(f, "Invalid price {price}: {reason}"),
            Self::InvalidPrice {
                price: None,
                reason,
            } => write!(f, "Invalid price: {reason}"),
            Self::UnsupportedOrderType(order_type) => {
                write!(f, "Order type {order_type} is not supported")
            }
        }
    }
}

impl std::error::Error for OrderError {}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn invalid_quantity_display() {
        let err = OrderError::InvalidQuantity {
            quantity: dec!(0.0025),
            reason: "not a multiple of step size 0.001".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid quantity 0.0025: not a multiple of step size 0.001"
        );
    }

    #[test]
    fn missing_price_display() {
        let err = OrderError::InvalidPrice {
            price: None,
            reason: "LIMIT orders need a price".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid price: LIMIT orders need a price");
    }
}
