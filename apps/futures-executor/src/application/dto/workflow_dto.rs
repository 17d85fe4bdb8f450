//! Workflow DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::use_cases::ReconciliationReport;
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderResponse, OrderSide, OrderType};
use crate::domain::shared::{ClientOrderId, Leverage, Symbol};
use crate::domain::sizing::QuantityComputation;
use crate::domain::workflow::WorkflowState;
use crate::error::ExecutionError;

/// Inputs for one position-opening attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowParams {
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Initial leverage to set before ordering.
    pub leverage: Leverage,
    /// Order side.
    pub side: OrderSide,
    /// MARKET or LIMIT.
    pub order_type: OrderType,
    /// Notional to spend, in USDT.
    pub usdt_amount: Decimal,
    /// Only reduce an existing position.
    pub reduce_only: bool,
    /// Read the available USDT balance before setting leverage.
    pub check_balance: bool,
}

impl WorkflowParams {
    /// Create parameters for a plain MARKET entry.
    #[must_use]
    pub const fn market(
        symbol: Symbol,
        leverage: Leverage,
        side: OrderSide,
        usdt_amount: Decimal,
    ) -> Self {
        Self {
            symbol,
            leverage,
            side,
            order_type: OrderType::Market,
            usdt_amount,
            reduce_only: false,
            check_balance: false,
        }
    }

    /// Use a different order type.
    #[must_use]
    pub const fn with_order_type(mut self, order_type: OrderType) -> Self {
        self.order_type = order_type;
        self
    }

    /// Set the reduce-only flag.
    #[must_use]
    pub const fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Enable or disable the balance pre-check.
    #[must_use]
    pub const fn with_balance_check(mut self, check_balance: bool) -> Self {
        self.check_balance = check_balance;
        self
    }
}

/// Everything a successful attempt produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowReport {
    /// Correlation id the order was sent with.
    pub client_order_id: ClientOrderId,
    /// Rules snapshot the order was sized against.
    pub rules: SymbolRules,
    /// Leverage the exchange confirmed.
    pub leverage: Leverage,
    /// Price the quantity was derived from (mark, or limit price for LIMIT).
    pub reference_price: Decimal,
    /// Quantity derivation.
    pub computation: QuantityComputation,
    /// Exchange response to the submission.
    pub order: OrderResponse,
    /// Positions read back after submission.
    pub reconciliation: ReconciliationReport,
    /// States visited, in order.
    pub history: Vec<WorkflowState>,
}

/// A failed attempt.
///
/// `order` is set when the failure happened after the exchange accepted the
/// order, so the caller knows a position may be open.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Workflow failed after {state_reached}: {error}")]
pub struct WorkflowFailure {
    /// Last state reached before failing.
    pub state_reached: WorkflowState,
    /// Originating error.
    #[source]
    pub error: ExecutionError,
    /// Correlation id, once one was generated.
    pub client_order_id: Option<ClientOrderId>,
    /// Accepted order, if the failure came after submission.
    pub order: Option<OrderResponse>,
    /// States visited, ending with `Failed`.
    pub history: Vec<WorkflowState>,
}

impl WorkflowFailure {
    /// Returns true if an order may exist on the exchange.
    #[must_use]
    pub const fn order_may_exist(&self) -> bool {
        self.order.is_some() || self.error.is_outcome_unknown()
    }
}
