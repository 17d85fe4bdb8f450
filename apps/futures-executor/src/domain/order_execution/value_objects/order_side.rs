//! Order side (buy or sell).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buy or sell).
///
/// On a one-way futures account a BUY opens or adds to a long position and
/// a SELL opens or adds to a short position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSide {
    /// Buy order.
    Buy,
    /// Sell order.
    Sell,
}

impl OrderSide {
    /// Map a position direction keyword (`LONG`/`SHORT`, `BUY`/`SELL`) to a side.
    ///
    /// Matching is case-insensitive. Returns `None` for anything else.
    #[must_use]
    pub fn from_direction(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "LONG" | "BUY" => Some(Self::Buy),
            "SHORT" | "SELL" => Some(Self::Sell),
            _ => None,
        }
    }

    /// Returns the opposite side.
    #[must_use]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns the sign of the position change.
    ///
    /// Buy = +1, Sell = -1
    #[must_use]
    pub const fn sign(&self) -> i32 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}
