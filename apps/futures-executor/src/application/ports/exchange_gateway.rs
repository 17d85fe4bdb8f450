//! Exchange Gateway Port (Driven Port)
//!
//! Interface for the futures exchange: trading rules, leverage, mark price,
//! order entry, positions and account balance.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderRequest, OrderResponse};
use crate::domain::position::Position;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};

/// Exchange confirmation of a leverage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeverageAck {
    /// Symbol the leverage applies to.
    pub symbol: Symbol,
    /// Leverage now in effect.
    pub leverage: Leverage,
    /// Largest position notional allowed at this leverage, when reported.
    pub max_notional_value: Option<Decimal>,
}

/// Exchange gateway error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// The exchange does not list the symbol.
    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol {
        /// The symbol that was looked up.
        symbol: String,
    },

    /// Transport failure or exchange-side outage. Safe to retry for reads.
    #[error("Exchange unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Business rejection, reported verbatim.
    #[error("Exchange rejected request ({code}): {message}")]
    Rejected {
        /// Exchange error code.
        code: i64,
        /// Exchange error message.
        message: String,
    },

    /// An order submission may or may not have reached the exchange.
    #[error("Outcome unknown for order {client_order_id}: {message}")]
    OutcomeUnknown {
        /// Correlation id to look the order up by.
        client_order_id: String,
        /// Error details.
        message: String,
    },

    /// Credentials missing, invalid or lacking permission.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Rate limited after retries were exhausted.
    #[error("Rate limited by exchange")]
    RateLimited,

    /// Order (or other entity) does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Error details.
        message: String,
    },
}

impl GatewayError {
    /// Returns true if repeating the same read may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::RateLimited)
    }
}

/// Port for futures exchange interactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ExchangeGateway: Send + Sync {
    /// Fetch the current trading rules for a symbol.
    async fn get_symbol_rules(&self, symbol: &Symbol) -> Result<SymbolRules, GatewayError>;

    /// Set the initial leverage for a symbol.
    async fn set_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> Result<LeverageAck, GatewayError>;

    /// Get the current mark price.
    async fn get_mark_price(&self, symbol: &Symbol) -> Result<Decimal, GatewayError>;

    /// Submit exactly one order. Implementations must not retry.
    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, GatewayError>;

    /// Get positions for a symbol.
    async fn get_positions(&self, symbol: &Symbol) -> Result<Vec<Position>, GatewayError>;

    /// Get the available balance of a margin asset (e.g. "USDT").
    async fn get_available_balance(&self, asset: &str) -> Result<Decimal, GatewayError>;

    /// Get open orders, optionally for one symbol.
    async fn get_open_orders(
        &self,
        symbol: Option<Symbol>,
    ) -> Result<Vec<OrderResponse>, GatewayError>;

    /// Cancel one order by exchange id.
    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: ExchangeOrderId,
    ) -> Result<OrderResponse, GatewayError>;

    /// Cancel every open order for a symbol.
    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<(), GatewayError>;

    /// Look an order up by its client order id.
    async fn query_order(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderResponse, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors() {
        assert!(
            GatewayError::Unavailable {
                message: "timeout".to_string()
            }
            .is_transient()
        );
        assert!(GatewayError::RateLimited.is_transient());
        assert!(
            !GatewayError::Rejected {
                code: -2019,
                message: "Margin is insufficient.".to_string()
            }
            .is_transient()
        );
        assert!(
            !GatewayError::OutcomeUnknown {
                client_order_id: "fx-1".to_string(),
                message: "timeout".to_string()
            }
            .is_transient()
        );
    }

    #[test]
    fn rejected_display_is_verbatim() {
        let err = GatewayError::Rejected {
            code: -4028,
            message: "Leverage 999 is not valid".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Exchange rejected request (-4028): Leverage 999 is not valid"
        );
    }
}
