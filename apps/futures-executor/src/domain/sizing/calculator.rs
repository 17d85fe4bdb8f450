//! Notional-to-quantity conversion.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::SizingError;
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::OrderType;

/// Outcome of a quantity derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityComputation {
    /// Exchange-legal quantity.
    pub quantity: Decimal,
    /// `usdt_amount / reference_price` before rounding.
    pub raw_quantity: Decimal,
    /// `quantity × reference_price`.
    pub notional: Decimal,
    /// Whether the quantity was reduced to the symbol's maximum lot.
    pub capped: bool,
}

/// Converts a desired USDT notional into a quantity that satisfies a
/// symbol's step size, precision, lot bounds and minimum notional.
///
/// Rounding is always toward zero, so the derived order is never worth more
/// than the amount the caller asked to spend.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuantityCalculator;

impl QuantityCalculator {
    /// Create a calculator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Derive the order quantity for `usdt_amount` at `reference_price`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Amount or price is not positive
    /// - Rules are internally inconsistent
    /// - The rounded quantity is zero or below the minimum lot
    /// - The rounded quantity's notional is below the minimum notional
    pub fn compute_quantity(
        &self,
        usdt_amount: Decimal,
        reference_price: Decimal,
        rules: &SymbolRules,
    ) -> Result<QuantityComputation, SizingError> {
        Self::derive(usdt_amount, reference_price, rules, rules.max_qty)
    }

    /// Same as [`compute_quantity`](Self::compute_quantity), capped at the
    /// lot limit for `order_type` (MARKET orders have their own).
    ///
    /// # Errors
    ///
    /// See [`compute_quantity`](Self::compute_quantity).
    pub fn compute_quantity_for(
        &self,
        order_type: OrderType,
        usdt_amount: Decimal,
        reference_price: Decimal,
        rules: &SymbolRules,
    ) -> Result<QuantityComputation, SizingError> {
        Self::derive(
            usdt_amount,
            reference_price,
            rules,
            rules.max_qty_for(order_type),
        )
    }

    fn derive(
        usdt_amount: Decimal,
        reference_price: Decimal,
        rules: &SymbolRules,
        max_qty: Decimal,
    ) -> Result<QuantityComputation, SizingError> {
        Self::validate_input(usdt_amount, reference_price)?;
        rules.validate()?;

        let raw_quantity = usdt_amount.checked_div(reference_price).ok_or_else(|| {
            SizingError::InvalidInput(format!(
                "{usdt_amount} / {reference_price} is not representable"
            ))
        })?;

        let stepped = rules.floor_to_step(raw_quantity);
        let mut quantity =
            stepped.round_dp_with_strategy(rules.quantity_precision, RoundingStrategy::ToZero);

        // Division rounds at 28 significant digits; undo a rounding that
        // pushed the quotient across a grid line.
        if quantity * reference_price > usdt_amount {
            quantity = (quantity - rules.step_size).max(Decimal::ZERO);
        }

        let mut capped = false;
        if quantity > max_qty {
            let max = rules.floor_to_step(max_qty);
            tracing::warn!(
                symbol = %rules.symbol,
                requested = %quantity,
                max = %max,
                "Quantity exceeds maximum lot, capping"
            );
            quantity = max;
            capped = true;
        }

        if quantity <= Decimal::ZERO || quantity < rules.min_qty {
            return Err(SizingError::QuantityTooSmall {
                quantity,
                min_qty: rules.min_qty,
                raw_quantity,
            });
        }

        let notional = quantity * reference_price;
        if notional < rules.min_notional {
            return Err(SizingError::BelowMinNotional {
                quantity,
                notional,
                min_notional: rules.min_notional,
            });
        }

        tracing::debug!(
            symbol = %rules.symbol,
            usdt_amount = %usdt_amount,
            reference_price = %reference_price,
            raw_quantity = %raw_quantity,
            quantity = %quantity,
            notional = %notional,
            "Quantity derived"
        );

        Ok(QuantityComputation {
            quantity: quantity.normalize(),
            raw_quantity,
            notional,
            capped,
        })
    }

    fn validate_input(usdt_amount: Decimal, reference_price: Decimal) -> Result<(), SizingError> {
        if usdt_amount <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "USDT amount must be positive, got {usdt_amount}"
            )));
        }
        if reference_price <= Decimal::ZERO {
            return Err(SizingError::InvalidInput(format!(
                "Reference price must be positive, got {reference_price}"
            )));
        }
        Ok(())
    }
}
