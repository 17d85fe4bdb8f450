//! Open Orders Use Case
//!
//! List, cancel and look up orders. Also the lookup a caller runs after
//! `SubmissionOutcomeUnknown` before deciding to try again.

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{ExchangeGateway, GatewayError};
use crate::domain::order_execution::OrderResponse;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Symbol};
use crate::error::ExecutionError;
use crate::observability::{record_gateway_request, update_open_orders};

/// Use case for managing resting orders.
pub struct OpenOrdersManager<G>
where
    G: ExchangeGateway,
{
    gateway: Arc<G>,
}

impl<G> OpenOrdersManager<G>
where
    G: ExchangeGateway,
{
    /// Create a new OpenOrdersManager.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// List open orders, for one symbol or all.
    pub async fn open_orders(
        &self,
        symbol: Option<&Symbol>,
    ) -> Result<Vec<OrderResponse>, ExecutionError> {
        let started = Instant::now();
        let orders = self
            .gateway
            .get_open_orders(symbol.cloned())
            .await
            .map_err(|e| self.fail("get_open_orders", e, started))?;
        record_gateway_request("get_open_orders", "ok", started.elapsed().as_secs_f64());

        if let Some(symbol) = symbol {
            update_open_orders(symbol.as_str(), orders.len());
        }
        tracing::info!(
            symbol = symbol.map_or("*", Symbol::as_str),
            count = orders.len(),
            "Open orders"
        );
        Ok(orders)
    }

    /// Cancel one order by exchange id.
    pub async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: ExchangeOrderId,
    ) -> Result<OrderResponse, ExecutionError> {
        let started = Instant::now();
        let response = self
            .gateway
            .cancel_order(symbol, order_id)
            .await
            .map_err(|e| self.fail("cancel_order", e, started))?;
        record_gateway_request("cancel_order", "ok", started.elapsed().as_secs_f64());

        tracing::info!(
            symbol = %symbol,
            order_id = %order_id,
            status = %response.status,
            "Order canceled"
        );
        Ok(response)
    }

    /// Cancel every open order for a symbol.
    pub async fn cancel_all(&self, symbol: &Symbol) -> Result<(), ExecutionError> {
        let started = Instant::now();
        self.gateway
            .cancel_all_orders(symbol)
            .await
            .map_err(|e| self.fail("cancel_all_orders", e, started))?;
        record_gateway_request("cancel_all_orders", "ok", started.elapsed().as_secs_f64());

        update_open_orders(symbol.as_str(), 0);
        tracing::info!(symbol = %symbol, "All open orders canceled");
        Ok(())
    }

    /// List the symbol's open orders, then cancel them all.
    ///
    /// Returns the orders that were open. Nothing is sent to the cancel
    /// endpoint when there are none.
    pub async fn cancel_all_open(
        &self,
        symbol: &Symbol,
    ) -> Result<Vec<OrderResponse>, ExecutionError> {
        let orders = self.open_orders(Some(symbol)).await?;
        if orders.is_empty() {
            tracing::info!(symbol = %symbol, "No open orders to cancel");
            return Ok(orders);
        }

        for order in &orders {
            tracing::info!(
                symbol = %symbol,
                order_id = %order.order_id,
                client_order_id = %order.client_order_id,
                side = %order.side,
                order_type = %order.order_type,
                price = %order.price,
                remaining_qty = %order.remaining_qty(),
                "Canceling open order"
            );
        }
        self.cancel_all(symbol).await?;
        Ok(orders)
    }

    /// Look an order up by client order id.
    ///
    /// Returns `Ok(None)` if the exchange does not show the order. After an
    /// unknown submission outcome that only means it is not visible yet: an
    /// order the backend timed out on can still appear later.
    pub async fn order_status(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<Option<OrderResponse>, ExecutionError> {
        let started = Instant::now();
        match self.gateway.query_order(symbol, client_order_id).await {
            Ok(response) => {
                record_gateway_request("query_order", "ok", started.elapsed().as_secs_f64());
                tracing::info!(
                    client_order_id = %client_order_id,
                    order_id = %response.order_id,
                    status = %response.status,
                    executed_qty = %response.executed_qty,
                    "Order status"
                );
                Ok(Some(response))
            }
            Err(GatewayError::NotFound { .. }) => {
                record_gateway_request("query_order", "not_found", started.elapsed().as_secs_f64());
                tracing::info!(client_order_id = %client_order_id, "Order not visible");
                Ok(None)
            }
            Err(e) => Err(self.fail("query_order", e, started)),
        }
    }

    fn fail(&self, operation: &str, err: GatewayError, started: Instant) -> ExecutionError {
        let err = ExecutionError::from_gateway(operation, err);
        record_gateway_request(operation, err.code().reason(), started.elapsed().as_secs_f64());
        tracing::error!(operation, error = %err, "Order management request failed");
        err
    }
}
