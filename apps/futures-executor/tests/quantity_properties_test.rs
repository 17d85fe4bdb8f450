//! Property Tests for Quantity Derivation
//!
//! Whatever the amount, price and (coherent) rules, a derived quantity sits
//! on the step grid, fits the declared precision, clears the notional floor
//! and never spends more than requested.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use futures_executor::domain::market_rules::SymbolRules;
use futures_executor::domain::shared::Symbol;
use futures_executor::domain::sizing::{QuantityCalculator, SizingError};

/// Positive decimal with two fractional digits, `cents / 100`.
fn cents(range: std::ops::Range<i64>) -> impl Strategy<Value = Decimal> {
    range.prop_map(|c| Decimal::new(c, 2))
}

/// Coherent rules: step `10^-decimals`, precision at least `decimals`.
fn rules() -> impl Strategy<Value = SymbolRules> {
    (0_u32..=5, 0_u32..=2, 1_i64..=200).prop_map(|(decimals, extra, min_notional)| {
        let step = Decimal::new(1, decimals);
        SymbolRules {
            symbol: Symbol::new("TESTUSDT"),
            price_precision: 2,
            quantity_precision: decimals + extra,
            min_price: dec!(0.01),
            max_price: dec!(1000000000),
            tick_size: dec!(0.01),
            min_qty: step,
            max_qty: dec!(1000000),
            market_max_qty: None,
            step_size: step,
            min_notional: Decimal::from(min_notional),
        }
    })
}

proptest! {
    #[test]
    fn derived_quantity_is_exchange_legal(
        usdt_amount in cents(1..10_000_000),
        price in cents(100..20_000_000),
        rules in rules(),
    ) {
        let calculator = QuantityCalculator::new();
        if let Ok(computation) = calculator.compute_quantity(usdt_amount, price, &rules) {
            let quantity = computation.quantity;
            prop_assert!(quantity > Decimal::ZERO);
            prop_assert!((quantity % rules.step_size).is_zero());
            prop_assert!(quantity.normalize().scale() <= rules.quantity_precision);
            prop_assert!(quantity * price >= rules.min_notional);
            prop_assert!(quantity * price <= usdt_amount);
            prop_assert_eq!(computation.notional, quantity * price);
        }
    }

    #[test]
    fn less_than_one_step_is_too_small(
        price in cents(100..20_000_000),
        rules in rules(),
        fraction in 1_u32..100,
    ) {
        // Spend a fraction of what one step costs.
        let usdt_amount = (rules.step_size * price * Decimal::new(i64::from(fraction), 2))
            .round_dp_with_strategy(8, rust_decimal::RoundingStrategy::ToZero);
        prop_assume!(usdt_amount > Decimal::ZERO);

        let result = QuantityCalculator::new().compute_quantity(usdt_amount, price, &rules);
        let is_too_small = matches!(result, Err(SizingError::QuantityTooSmall { .. }));
        prop_assert!(is_too_small);
    }

    #[test]
    fn failures_are_only_size_related(
        usdt_amount in cents(1..10_000_000),
        price in cents(100..20_000_000),
        rules in rules(),
    ) {
        match QuantityCalculator::new().compute_quantity(usdt_amount, price, &rules) {
            Ok(_) | Err(SizingError::QuantityTooSmall { .. } | SizingError::BelowMinNotional { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }
}

#[test]
fn btcusdt_reference_amounts() {
    let rules = SymbolRules {
        symbol: Symbol::new("BTCUSDT"),
        price_precision: 2,
        quantity_precision: 3,
        min_price: dec!(261.10),
        max_price: dec!(809484),
        tick_size: dec!(0.10),
        min_qty: dec!(0.001),
        max_qty: dec!(1000),
        market_max_qty: Some(dec!(120)),
        step_size: dec!(0.001),
        min_notional: dec!(100),
    };
    let calculator = QuantityCalculator::new();
    let price = dec!(67398.54374468);

    assert!(matches!(
        calculator.compute_quantity(dec!(100), price, &rules),
        Err(SizingError::BelowMinNotional { .. })
    ));
    assert_eq!(
        calculator
            .compute_quantity(dec!(200), price, &rules)
            .unwrap()
            .quantity,
        dec!(0.002)
    );
}
