//! Position Reconciler Use Case

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::application::ports::ExchangeGateway;
use crate::domain::position::Position;
use crate::domain::shared::Symbol;
use crate::error::ExecutionError;
use crate::observability::record_gateway_request;

/// Positions read back after a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Symbol that was read.
    pub symbol: Symbol,
    /// Every position entry the exchange returned (both sides in hedge mode).
    pub positions: Vec<Position>,
}

impl ReconciliationReport {
    /// Positions that hold contracts.
    #[must_use]
    pub fn open_positions(&self) -> Vec<&Position> {
        self.positions.iter().filter(|p| !p.is_flat()).collect()
    }

    /// Returns true if the exchange reports no open exposure.
    #[must_use]
    pub fn is_flat(&self) -> bool {
        self.positions.iter().all(Position::is_flat)
    }
}

/// Reads exchange-side positions after a submission.
///
/// Strictly a read: its result never decides whether an order is resent.
pub struct PositionReconciler<G>
where
    G: ExchangeGateway,
{
    gateway: Arc<G>,
    settle_delay: Duration,
}

impl<G> PositionReconciler<G>
where
    G: ExchangeGateway,
{
    /// Create a reconciler that reads immediately.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            settle_delay: Duration::ZERO,
        }
    }

    /// Wait `delay` before reading so the exchange can apply the fill.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Read and report positions for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayUnavailable`, `UnknownSymbol` or `AuthenticationFailed`
    /// from the gateway.
    pub async fn reconcile(&self, symbol: &Symbol) -> Result<ReconciliationReport, ExecutionError> {
        if !self.settle_delay.is_zero() {
            tracing::debug!(
                delay_ms = self.settle_delay.as_millis(),
                "Waiting for fills to settle"
            );
            tokio::time::sleep(self.settle_delay).await;
        }

        let started = Instant::now();
        let positions = match self.gateway.get_positions(symbol).await {
            Ok(positions) => {
                record_gateway_request("get_positions", "ok", started.elapsed().as_secs_f64());
                positions
            }
            Err(err) => {
                let err = ExecutionError::from_gateway("get_positions", err);
                record_gateway_request(
                    "get_positions",
                    err.code().reason(),
                    started.elapsed().as_secs_f64(),
                );
                return Err(err);
            }
        };

        let report = ReconciliationReport {
            symbol: symbol.clone(),
            positions,
        };

        if report.is_flat() {
            tracing::warn!(symbol = %symbol, "No open position reported after submission");
        }
        for position in report.open_positions() {
            tracing::info!(
                symbol = %position.symbol,
                direction = %position.direction(),
                position_amt = %position.position_amt,
                entry_price = %position.entry_price,
                leverage = %position.leverage,
                margin_type = %position.margin_type,
                liquidation_price = %position.liquidation_price,
                unrealized_profit = %position.unrealized_profit,
                "Position"
            );
        }

        Ok(report)
    }
}
