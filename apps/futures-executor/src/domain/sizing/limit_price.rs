//! LIMIT order pricing relative to the mark price.

use rust_decimal::{Decimal, RoundingStrategy};

use super::error::SizingError;
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::value_objects::OrderSide;
use crate::domain::shared::DomainError;

/// Distance from the mark price for resting LIMIT orders (1%).
pub const LIMIT_PRICE_OFFSET: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Derives a resting LIMIT price one offset away from the mark price.
///
/// Buys rest below the mark and sells above it, so the order does not cross
/// the book on arrival.
#[derive(Debug, Clone, Copy)]
pub struct LimitPricer {
    offset: Decimal,
}

impl Default for LimitPricer {
    fn default() -> Self {
        Self {
            offset: LIMIT_PRICE_OFFSET,
        }
    }
}

impl LimitPricer {
    /// Create a pricer with a custom offset (0.01 = 1%).
    #[must_use]
    pub const fn with_offset(offset: Decimal) -> Self {
        Self { offset }
    }

    /// Compute the LIMIT price for `side` given the current mark price.
    ///
    /// The price is floored to the tick grid and truncated to the symbol's
    /// price precision.
    ///
    /// # Errors
    ///
    /// Returns error if the mark price is not positive, the offset is outside
    /// `[0, 1)`, or the resulting price falls outside the symbol's price band.
    pub fn limit_price(
        &self,
        side: OrderSide,
        mark_price: Decimal,
        rules: &SymbolRules,
    ) -> Result<Decimal, SizingError> {
        if mark_price <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "Mark price must be positive, got {mark_price}"
            )));
        }
        if self.offset < Decimal::ZERO || self.offset >= Decimal::ONE {
            return Err(SizingError::InvalidInput(format!(
                "Limit offset must be in [0, 1), got {}",
                self.offset
            )));
        }

        let factor = match side {
            OrderSide::Buy => Decimal::ONE - self.offset,
            OrderSide::Sell => Decimal::ONE + self.offset,
        };

        let price = rules
            .floor_to_tick(mark_price * factor)
            .round_dp_with_strategy(rules.price_precision, RoundingStrategy::ToZero);

        if !rules.is_tick_aligned(price) {
            return Err(SizingError::InvalidRules(DomainError::InvalidRules {
                symbol: rules.symbol.to_string(),
                message: format!(
                    "tick size {} needs more than {} decimals",
                    rules.tick_size, rules.price_precision
                ),
            }));
        }

        if price < rules.min_price || price > rules.max_price {
            return Err(SizingError::InvalidInput(format!(
                "Limit price {price} is outside [{}, {}]",
                rules.min_price, rules.max_price
            )));
        }

        Ok(price.normalize())
    }
}
