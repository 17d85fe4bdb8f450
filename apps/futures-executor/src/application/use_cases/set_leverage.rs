//! Leverage Manager Use Case

use std::sync::Arc;
use std::time::Instant;

use crate::application::ports::{ExchangeGateway, GatewayError};
use crate::domain::shared::{Leverage, Symbol};
use crate::error::ExecutionError;
use crate::observability::record_gateway_request;

/// Sets the initial leverage for a symbol.
///
/// Setting the leverage already in effect is a successful no-op on the
/// exchange side, so calling this twice with the same value is safe.
pub struct LeverageManager<G>
where
    G: ExchangeGateway,
{
    gateway: Arc<G>,
}

impl<G> LeverageManager<G>
where
    G: ExchangeGateway,
{
    /// Create a new LeverageManager.
    pub const fn new(gateway: Arc<G>) -> Self {
        Self { gateway }
    }

    /// Set leverage and return the value the exchange confirmed.
    ///
    /// # Errors
    ///
    /// - `LeverageOutOfRange` for zero leverage or any exchange rejection
    /// - `UnknownSymbol` if the exchange does not list the symbol
    /// - `GatewayUnavailable` on transport failure
    pub async fn set_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> Result<Leverage, ExecutionError> {
        if !leverage.is_positive() {
            return Err(ExecutionError::LeverageOutOfRange {
                symbol: symbol.to_string(),
                requested: leverage.value(),
                message: "leverage must be at least 1".to_string(),
            });
        }

        let started = Instant::now();
        let result = self.gateway.set_leverage(symbol, leverage).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(ack) => {
                record_gateway_request("set_leverage", "ok", elapsed);
                if ack.leverage != leverage {
                    tracing::warn!(
                        symbol = %symbol,
                        requested = %leverage,
                        confirmed = %ack.leverage,
                        "Exchange confirmed a different leverage"
                    );
                }
                tracing::info!(
                    symbol = %symbol,
                    leverage = %ack.leverage,
                    max_notional = ?ack.max_notional_value,
                    "Leverage set"
                );
                Ok(ack.leverage)
            }
            Err(GatewayError::Rejected { code, message }) => {
                record_gateway_request("set_leverage", "rejected", elapsed);
                tracing::warn!(
                    symbol = %symbol,
                    leverage = %leverage,
                    code,
                    message = %message,
                    "Leverage rejected"
                );
                Err(ExecutionError::LeverageOutOfRange {
                    symbol: symbol.to_string(),
                    requested: leverage.value(),
                    message: format!("{code}: {message}"),
                })
            }
            Err(err) => {
                let err = ExecutionError::from_gateway("set_leverage", err);
                record_gateway_request("set_leverage", err.code().reason(), elapsed);
                Err(err)
            }
        }
    }
}
