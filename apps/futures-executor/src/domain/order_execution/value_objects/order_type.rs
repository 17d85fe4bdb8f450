//! Futures order types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Order type specifying execution behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    /// Market order - execute at best available price.
    Market,
    /// Limit order - execute at specified price or better.
    Limit,
    /// Stop-limit order - becomes limit order when stop price is reached.
    Stop,
    /// Stop-market order - becomes market order when stop price is reached.
    StopMarket,
    /// Take-profit limit order.
    TakeProfit,
    /// Take-profit market order.
    TakeProfitMarket,
    /// Trailing stop market order.
    TrailingStopMarket,
}

impl OrderType {
    /// Parse the wire/config representation (`MARKET`, `LIMIT`, ...).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "MARKET" => Some(Self::Market),
            "LIMIT" => Some(Self::Limit),
            "STOP" => Some(Self::Stop),
            "STOP_MARKET" => Some(Self::StopMarket),
            "TAKE_PROFIT" => Some(Self::TakeProfit),
            "TAKE_PROFIT_MARKET" => Some(Self::TakeProfitMarket),
            "TRAILING_STOP_MARKET" => Some(Self::TrailingStopMarket),
            _ => None,
        }
    }

    /// Returns true if this order type requires a limit price.
    #[must_use]
    pub const fn requires_limit_price(&self) -> bool {
        matches!(self, Self::Limit | Self::Stop | Self::TakeProfit)
    }

    /// Returns true if this order type is triggered by a stop price.
    #[must_use]
    pub const fn requires_stop_price(&self) -> bool {
        matches!(
            self,
            Self::Stop
                | Self::StopMarket
                | Self::TakeProfit
                | Self::TakeProfitMarket
                | Self::TrailingStopMarket
        )
    }

    /// Returns true if this is a market order (immediate execution).
    #[must_use]
    pub const fn is_market(&self) -> bool {
        matches!(self, Self::Market)
    }

    /// Returns true if the position opener can place this type directly.
    #[must_use]
    pub const fn is_supported_entry(&self) -> bool {
        matches!(self, Self::Market | Self::Limit)
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Market => write!(f, "MARKET"),
            Self::Limit => write!(f, "LIMIT"),
            Self::Stop => write!(f, "STOP"),
            Self::StopMarket => write!(f, "STOP_MARKET"),
            Self::TakeProfit => write!(f, "TAKE_PROFIT"),
            Self::TakeProfitMarket => write!(f, "TAKE_PROFIT_MARKET"),
            Self::TrailingStopMarket => write!(f, "TRAILING_STOP_MARKET"),
        }
    }
}
