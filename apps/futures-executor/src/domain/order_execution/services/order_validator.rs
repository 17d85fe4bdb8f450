//! Pre-submission order validation against exchange rules.

use rust_decimal::Decimal;

use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::errors::OrderError;
use crate::domain::order_execution::order::OrderRequest;
use crate::domain::order_execution::value_objects::OrderType;

/// Checks an order request against a symbol's rules before it is sent.
///
/// Everything the exchange would reject for LOT_SIZE or PRICE_FILTER
/// reasons is caught here, so a rejection from the exchange always carries
/// information we could not have known locally.
pub struct OrderValidator;

impl OrderValidator {
    /// Validate an order request.
    ///
    /// # Errors
    ///
    /// Returns the first rule the request breaks.
    pub fn validate(request: &OrderRequest, rules: &SymbolRules) -> Result<(), OrderError> {
        if request.symbol != rules.symbol {
            return Err(OrderError::SymbolMismatch {
                expected: rules.symbol.to_string(),
                actual: request.symbol.to_string(),
            });
        }

        if !request.order_type.is_supported_entry() {
            return Err(OrderError::UnsupportedOrderType(request.order_type));
        }

        Self::validate_quantity(request.quantity, rules)?;
        let max_qty = rules.max_qty_for(request.order_type);
        if request.quantity > max_qty {
            return Err(OrderError::InvalidQuantity {
                quantity: request.quantity,
                reason: format!("above {} maximum {max_qty}", request.order_type),
            });
        }

        match request.order_type {
            OrderType::Limit => match request.price {
                Some(price) => Self::validate_price(price, rules),
                None => Err(OrderError::InvalidPrice {
                    price: None,
                    reason: "LIMIT orders need a price".to_string(),
                }),
            },
            _ => match request.price {
                Some(price) => Err(OrderError::InvalidPrice {
                    price: Some(price),
                    reason: format!("{} orders must not carry a price", request.order_type),
                }),
                None => Ok(()),
            },
        }
    }

    /// Validate a quantity against LOT_SIZE and precision.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidQuantity` naming the broken rule.
    pub fn validate_quantity(quantity: Decimal, rules: &SymbolRules) -> Result<(), OrderError> {
        let fail = |reason: String| Err(OrderError::InvalidQuantity { quantity, reason });

        if quantity <= Decimal::ZERO {
            return fail("must be positive".to_string());
        }
        if quantity < rules.min_qty {
            return fail(format!("below minimum {}", rules.min_qty));
        }
        if quantity > rules.max_qty {
            return fail(format!("above maximum {}", rules.max_qty));
        }
        if !rules.is_step_aligned(quantity) {
            return fail(format!("not a multiple of step size {}", rules.step_size));
        }
        if !rules.fits_quantity_precision(quantity) {
            return fail(format!(
                "more than {} decimal places",
                rules.quantity_precision
            ));
        }

        Ok(())
    }

    /// Validate a price against PRICE_FILTER and precision.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidPrice` naming the broken rule.
    pub fn validate_price(price: Decimal, rules: &SymbolRules) -> Result<(), OrderError> {
        let fail = |reason: String| {
            Err(OrderError::InvalidPrice {
                price: Some(price),
                reason,
            })
        };

        if price < rules.min_price || price > rules.max_price {
            return fail(format!(
                "outside [{}, {}]",
                rules.min_price, rules.max_price
            ));
        }
        if !rules.is_tick_aligned(price) {
            return fail(format!("not a multiple of tick size {}", rules.tick_size));
        }
        if !rules.fits_price_precision(price) {
            return fail(format!("more than {} decimal places", rules.price_precision));
        }

        Ok(())
    }
}
