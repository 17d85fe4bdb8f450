//! Exchange-reported futures position.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::shared::{Leverage, Symbol};

/// Margin mode of a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarginType {
    /// Margin shared across all cross positions.
    Cross,
    /// Margin isolated to this position.
    Isolated,
}

impl MarginType {
    /// Parse the exchange representation (`cross`, `isolated`, any case).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "CROSS" | "CROSSED" => Some(Self::Cross),
            "ISOLATED" => Some(Self::Isolated),
            _ => None,
        }
    }
}

impl fmt::Display for MarginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cross => write!(f, "CROSS"),
            Self::Isolated => write!(f, "ISOLATED"),
        }
    }
}

/// Direction implied by the sign of a position amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PositionDirection {
    /// Positive amount.
    Long,
    /// Negative amount.
    Short,
    /// Zero amount.
    Flat,
}

impl fmt::Display for PositionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Long => write!(f, "LONG"),
            Self::Short => write!(f, "SHORT"),
            Self::Flat => write!(f, "FLAT"),
        }
    }
}

/// Position as the exchange reports it.
///
/// This is exchange-side truth used as a post-trade consistency check. It is
/// never cached and never used to decide whether to resubmit an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Symbol.
    pub symbol: Symbol,
    /// Signed size: positive is long, negative is short.
    pub position_amt: Decimal,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Current mark price.
    pub mark_price: Decimal,
    /// Leverage applied to the position.
    pub leverage: Leverage,
    /// Margin mode.
    pub margin_type: MarginType,
    /// Liquidation price (zero when flat).
    pub liquidation_price: Decimal,
    /// Unrealized profit in quote asset.
    pub unrealized_profit: Decimal,
}

impl Position {
    /// Direction implied by the sign of `position_amt`.
    #[must_use]
    pub fn direction(&self) -> PositionDirection {
        if self.position_amt > Decimal::ZERO {
            PositionDirection::Long
        } else if self.position_amt < Decimal::ZERO {
            PositionDirection::Short
        } else {
            PositionDirection::Flat
        }
    }

    /// Returns true if the position holds no contracts.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.position_amt.is_zero()
    }

    /// Absolute position value at the mark price.
    #[must_use]
    pub fn notional(&self) -> Decimal {
        (self.position_amt * self.mark_price).abs()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use rust_decimal_macros::dec;

    use super::*;

    /// A small long BTCUSDT position.
    pub fn btc_long() -> Position {
        Position {
            symbol: Symbol::new("BTCUSDT"),
            position_amt: dec!(0.002),
            entry_price: dec!(67398.5),
            mark_price: dec!(67400),
            leverage: Leverage::new(20),
            margin_type: MarginType::Cross,
            liquidation_price: dec!(64210.3),
            unrealized_profit: dec!(0.003),
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::fixtures::btc_long;
    use super::*;

    #[test]
    fn direction_from_sign() {
        let long = btc_long();
        assert_eq!(long.direction(), PositionDirection::Long);

        let short = Position {
            position_amt: dec!(-0.002),
            ..btc_long()
        };
        assert_eq!(short.direction(), PositionDirection::Short);

        let flat = Position {
            position_amt: Decimal::ZERO,
            ..btc_long()
        };
        assert_eq!(flat.direction(), PositionDirection::Flat);
        assert!(flat.is_flat());
    }

    #[test]
    fn notional_is_absolute() {
        let short = Position {
            position_amt: dec!(-0.002),
            ..btc_long()
        };
        assert_eq!(short.notional(), dec!(134.8));
    }

    #[test]
    fn margin_type_parse() {
        assert_eq!(MarginType::parse("cross"), Some(MarginType::Cross));
        assert_eq!(MarginType::parse("isolated"), Some(MarginType::Isolated));
        assert_eq!(MarginType::parse("portfolio"), None);
    }
}
