//! Error types for quantity derivation.

use rust_decimal::Decimal;
use std::fmt;

use crate::domain::shared::DomainError;

/// Error while converting a notional amount into an order quantity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    /// Invalid input (zero or negative amount or price).
    InvalidInput(String),
    /// Rules snapshot is unusable for sizing.
    InvalidRules(DomainError),
    /// Quantity rounds to zero or falls below the minimum lot.
    QuantityTooSmall {
        /// Quantity after rounding onto the step grid.
        quantity: Decimal,
        /// Smallest quantity the exchange accepts.
        min_qty: Decimal,
        /// Quantity before rounding.
        raw_quantity: Decimal,
    },
    /// Rounded quantity is worth less than the exchange's minimum notional.
    BelowMinNotional {
        /// Quantity after rounding onto the step grid.
        quantity: Decimal,
        /// `quantity × price`.
        notional: Decimal,
        /// Exchange floor for `quantity × price`.
        min_notional: Decimal,
    },
}

impl fmt::Display for SizingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
            Self::InvalidRules(err) => write!(f, "{err}"),
            Self::QuantityTooSmall {
                quantity,
                min_qty,
                raw_quantity,
            } => {
                write!(
                    f,
                    "Quantity {quantity} (raw {raw_quantity}) is below minimum {min_qty}"
                )
            }
            Self::BelowMinNotional {
                quantity,
                notional,
                min_notional,
            } => {
                write!(
                    f,
                    "Notional {notional} for quantity {quantity} is below minimum {min_notional}"
                )
            }
        }
    }
}

impl std::error::Error for SizingError {}

impl From<DomainError> for SizingError {
    fn from(err: DomainError) -> Self {
        Self::InvalidRules(err)
    }
}
