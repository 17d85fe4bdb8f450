//! Order Submitter Use Case

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{ExchangeGateway, GatewayError};
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderRequest, OrderResponse, OrderValidator};
use crate::error::ExecutionError;
use crate::observability::{record_gateway_request, record_order_submission};

/// Validates and submits exactly one order.
///
/// There is no automatic retry. A timeout or server error after the request
/// left the process surfaces as `SubmissionOutcomeUnknown`; the caller must
/// look the order up by its client order id before trying again with a new
/// one.
pub struct OrderSubmitter<G>
where
    G: ExchangeGateway,
{
    gateway: Arc<G>,
}

impl<G> OrderSubmitter<G>
where
    G: ExchangeGateway,
{
    /// Create a new OrderSubmitter.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Validate `request` against `rules`, then send it once.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity` if local validation fails (nothing is sent)
    /// - `OrderRejected` with the exchange's code and message
    /// - `SubmissionOutcomeUnknown` if the order may exist
    /// - `GatewayUnavailable` if the request never reached the exchange
    pub async fn submit(
        &self,
        request: &OrderRequest,
        rules: &SymbolRules,
    ) -> Result<OrderResponse, ExecutionError> {
        if let Err(err) = OrderValidator::validate(request, rules) {
            tracing::warn!(
                symbol = %request.symbol,
                client_order_id = %request.client_order_id,
                error = %err,
                "Order failed local validation"
            );
            record_order_submission("INVALID_QUANTITY", &request.order_type.to_string());
            return Err(err.into());
        }

        tracing::info!(
            symbol = %request.symbol,
            side = %request.side,
            order_type = %request.order_type,
            quantity = %request.quantity,
            price = ?request.price,
            reduce_only = request.reduce_only,
            client_order_id = %request.client_order_id,
            "Submitting order"
        );

        let started = Instant::now();
        let result = self.gateway.submit_order(request).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(response) => {
                record_gateway_request("submit_order", "ok", elapsed);
                record_order_submission(
                    &response.status.to_string(),
                    &request.order_type.to_string(),
                );
                tracing::info!(
                    order_id = %response.order_id,
                    client_order_id = %response.client_order_id,
                    status = %response.status,
                    executed_qty = %response.executed_qty,
                    avg_price = %response.avg_price,
                    "Order accepted"
                );
                Ok(response)
            }
            Err(err) => {
                let err = match err {
                    // The gateway may not know the id for some transport errors.
                    GatewayError::OutcomeUnknown { message, .. } => {
                        ExecutionError::SubmissionOutcomeUnknown {
                            client_order_id: request.client_order_id.to_string(),
                            message,
                        }
                    }
                    other => ExecutionError::from_gateway("submit_order", other),
                };
                record_gateway_request("submit_order", err.code().reason(), elapsed);
                record_order_submission(err.code().reason(), &request.order_type.to_string());

                if err.is_outcome_unknown() {
                    tracing::error!(
                        client_order_id = %request.client_order_id,
                        error = %err,
                        "Order outcome unknown, look it up before resubmitting"
                    );
                } else {
                    tracing::error!(
                        client_order_id = %request.client_order_id,
                        error = %err,
                        "Order submission failed"
                    );
                }
                Err(err)
            }
        }
    }
}
