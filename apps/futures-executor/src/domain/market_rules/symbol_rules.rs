//! Exchange trading rules for one futures symbol.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::order_execution::OrderType;
use crate::domain::shared::{DomainError, Symbol};

/// Snapshot of the exchange's trading rules for a symbol.
///
/// Fetched once per order attempt and passed by value between steps. The
/// exchange may change rules at any time, so a snapshot must not outlive the
/// attempt it was fetched for unless the caller accepts a staleness budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRules {
    /// Symbol the rules apply to.
    pub symbol: Symbol,
    /// Decimal places allowed in a price.
    pub price_precision: u32,
    /// Decimal places allowed in a quantity.
    pub quantity_precision: u32,
    /// Lowest accepted order price.
    pub min_price: Decimal,
    /// Highest accepted order price.
    pub max_price: Decimal,
    /// Price granularity.
    pub tick_size: Decimal,
    /// Lowest accepted order quantity.
    pub min_qty: Decimal,
    /// Highest accepted order quantity.
    pub max_qty: Decimal,
    /// Highest accepted MARKET order quantity, when the exchange sets a
    /// separate market lot limit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_max_qty: Option<Decimal>,
    /// Quantity granularity.
    pub step_size: Decimal,
    /// Minimum `quantity × price` for an order.
    pub min_notional: Decimal,
}

impl SymbolRules {
    /// Check the snapshot's internal invariants.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRules` describing the first violated
    /// invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        let fail = |message: String| {
            Err(DomainError::InvalidRules {
                symbol: self.symbol.to_string(),
                message,
            })
        };

        if self.step_size <= Decimal::ZERO {
            return fail(format!("step size {} must be positive", self.step_size));
        }
        if !self.fits_quantity_precision(self.step_size) {
            return fail(format!(
                "step size {} needs more than {} decimals",
                self.step_size, self.quantity_precision
            ));
        }
        if self.tick_size <= Decimal::ZERO {
            return fail(format!("tick size {} must be positive", self.tick_size));
        }
        if self.min_notional <= Decimal::ZERO {
            return fail(format!(
                "min notional {} must be positive",
                self.min_notional
            ));
        }
        if self.min_price <= Decimal::ZERO || self.min_price > self.max_price {
            return fail(format!(
                "price bounds [{}, {}] are not a positive range",
                self.min_price, self.max_price
            ));
        }
        if self.min_qty <= Decimal::ZERO || self.min_qty > self.max_qty {
            return fail(format!(
                "quantity bounds [{}, {}] are not a positive range",
                self.min_qty, self.max_qty
            ));
        }
        if let Some(market_max_qty) = self.market_max_qty
            && market_max_qty < self.min_qty
        {
            return fail(format!(
                "market max quantity {market_max_qty} is below minimum {}",
                self.min_qty
            ));
        }

        Ok(())
    }

    /// Largest quantity accepted for an order of `order_type`.
    ///
    /// MARKET orders are bounded by the tighter of the two lot limits.
    #[must_use]
    pub fn max_qty_for(&self, order_type: OrderType) -> Decimal {
        match (order_type, self.market_max_qty) {
            (OrderType::Market, Some(market_max_qty)) => market_max_qty.min(self.max_qty),
            _ => self.max_qty,
        }
    }

    /// Round a quantity toward zero onto the step grid.
    #[must_use]
    pub fn floor_to_step(&self, quantity: Decimal) -> Decimal {
        floor_to_increment(quantity, self.step_size)
    }

    /// Round a price toward zero onto the tick grid.
    #[must_use]
    pub fn floor_to_tick(&self, price: Decimal) -> Decimal {
        floor_to_increment(price, self.tick_size)
    }

    /// Check that a quantity is an exact multiple of the step size.
    #[must_use]
    pub fn is_step_aligned(&self, quantity: Decimal) -> bool {
        is_multiple_of(quantity, self.step_size)
    }

    /// Check that a price is an exact multiple of the tick size.
    #[must_use]
    pub fn is_tick_aligned(&self, price: Decimal) -> bool {
        is_multiple_of(price, self.tick_size)
    }

    /// Check that a quantity needs no more digits than `quantity_precision`.
    #[must_use]
    pub fn fits_quantity_precision(&self, quantity: Decimal) -> bool {
        quantity.normalize().scale() <= self.quantity_precision
    }

    /// Check that a price needs no more digits than `price_precision`.
    #[must_use]
    pub fn fits_price_precision(&self, price: Decimal) -> bool {
        price.normalize().scale() <= self.price_precision
    }
}

fn floor_to_increment(value: Decimal, increment: Decimal) -> Decimal {
    if increment <= Decimal::ZERO {
        return value;
    }
    value
        .checked_div(increment)
        .and_then(|units| units.trunc().checked_mul(increment))
        .map_or(Decimal::ZERO, |v| v.normalize())
}

fn is_multiple_of(value: Decimal, increment: Decimal) -> bool {
    if increment <= Decimal::ZERO {
        return false;
    }
    value
        .checked_rem(increment)
        .is_some_and(|remainder| remainder.is_zero())
}


#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::fixtures::btcusdt;
    use super::*;

    #[test]
    fn valid_rules_pass() {
        assert!(btcusdt().validate().is_ok());
    }

    #[test]
    fn zero_step_size_is_invalid() {
        let rules = SymbolRules {
            step_size: Decimal::ZERO,
            ..btcusdt()
        };
        let err = rules.validate().unwrap_err();
        assert!(err.to_string().contains("step size"));
    }

    #[test]
    fn step_size_finer_than_quantity_precision_is_invalid() {
        let rules = SymbolRules {
            quantity_precision: 2,
            step_size: dec!(0.001),
            ..btcusdt()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn inverted_price_bounds_are_invalid() {
        let rules = SymbolRules {
            min_price: dec!(10),
            max_price: dec!(5),
            ..btcusdt()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn inverted_quantity_bounds_are_invalid() {
        let rules = SymbolRules {
            min_qty: dec!(2),
            max_qty: dec!(1),
            ..btcusdt()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn market_orders_use_the_market_lot_limit() {
        let rules = btcusdt();
        assert_eq!(rules.max_qty_for(OrderType::Market), dec!(120));
        assert_eq!(rules.max_qty_for(OrderType::Limit), dec!(1000));

        let without_market_lot = SymbolRules {
            market_max_qty: None,
            ..btcusdt()
        };
        assert_eq!(without_market_lot.max_qty_for(OrderType::Market), dec!(1000));
    }

    #[test]
    fn market_lot_limit_below_minimum_is_invalid() {
        let rules = SymbolRules {
            market_max_qty: Some(dec!(0.0005)),
            ..btcusdt()
        };
        assert!(rules.validate().is_err());
    }

    #[test]
    fn floor_to_step_truncates() {
        let rules = btcusdt();
        assert_eq!(rules.floor_to_step(dec!(0.0029674)), dec!(0.002));
        assert_eq!(rules.floor_to_step(dec!(0.0009)), dec!(0));
    }

    #[test]
    fn floor_to_tick_truncates() {
        let rules = btcusdt();
        assert_eq!(rules.floor_to_tick(dec!(66724.558307)), dec!(66724.5));
    }

    #[test]
    fn step_alignment() {
        let rules = btcusdt();
        assert!(rules.is_step_aligned(dec!(0.002)));
        assert!(rules.is_step_aligned(dec!(0.0020)));
        assert!(!rules.is_step_aligned(dec!(0.0025)));
    }

    #[test]
    fn precision_ignores_trailing_zeros() {
        let rules = btcusdt();
        assert!(rules.fits_quantity_precision(dec!(0.00200)));
        assert!(!rules.fits_quantity_precision(dec!(0.0021)));
        assert!(rules.fits_price_precision(dec!(66724.50)));
        assert!(!rules.fits_price_precision(dec!(66724.505)));
    }
}
