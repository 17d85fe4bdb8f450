//! Order request and exchange response types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::value_objects::{OrderSide, OrderStatus, OrderType, TimeInForce};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Symbol};

/// Request to open (or reduce) a futures position with one order.
///
/// Built once per attempt and never mutated after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Caller-assigned correlation id, unique per attempt.
    pub client_order_id: ClientOrderId,
    /// Symbol to trade.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Quantity in base asset units.
    pub quantity: Decimal,
    /// Limit price (LIMIT orders only).
    pub price: Option<Decimal>,
    /// Time in force (LIMIT orders only).
    pub time_in_force: Option<TimeInForce>,
    /// Only reduce an existing position, never open or flip one.
    pub reduce_only: bool,
}

impl OrderRequest {
    /// Create a market order request.
    #[must_use]
    pub const fn market(
        client_order_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
    ) -> Self {
        Self {
            client_order_id,
            symbol,
            side,
            order_type: OrderType::Market,
            quantity,
            price: None,
            time_in_force: None,
            reduce_only: false,
        }
    }

    /// Create a GTC limit order request.
    #[must_use]
    pub const fn limit(
        client_order_id: ClientOrderId,
        symbol: Symbol,
        side: OrderSide,
        quantity: Decimal,
        price: Decimal,
    ) -> Self {
        Self {
            client_order_id,
            symbol,
            side,
            order_type: OrderType::Limit,
            quantity,
            price: Some(price),
            time_in_force: Some(TimeInForce::Gtc),
            reduce_only: false,
        }
    }

    /// Set the reduce-only flag.
    #[must_use]
    pub const fn with_reduce_only(mut self, reduce_only: bool) -> Self {
        self.reduce_only = reduce_only;
        self
    }

    /// Set time in force.
    #[must_use]
    pub const fn with_time_in_force(mut self, tif: TimeInForce) -> Self {
        self.time_in_force = Some(tif);
        self
    }
}

/// Exchange view of an order at the moment it was reported.
///
/// May be stale relative to later fills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    /// Exchange-assigned order id.
    pub order_id: ExchangeOrderId,
    /// Client order id echoed back.
    pub client_order_id: ClientOrderId,
    /// Symbol.
    pub symbol: Symbol,
    /// Order side.
    pub side: OrderSide,
    /// Order type.
    pub order_type: OrderType,
    /// Current status.
    pub status: OrderStatus,
    /// Quantity requested.
    pub orig_qty: Decimal,
    /// Quantity executed so far.
    pub executed_qty: Decimal,
    /// Cumulative quote asset transacted.
    pub cum_quote: Decimal,
    /// Average fill price (zero when nothing filled).
    pub avg_price: Decimal,
    /// Limit price (zero for market orders).
    pub price: Decimal,
    /// Reduce-only flag.
    pub reduce_only: bool,
    /// Last update time reported by the exchange.
    pub update_time: DateTime<Utc>,
}

impl OrderResponse {
    /// Quantity still open.
    #[must_use]
    pub fn remaining_qty(&self) -> Decimal {
        (self.orig_qty - self.executed_qty).max(Decimal::ZERO)
    }
}
