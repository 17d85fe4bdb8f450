//! Binance futures gateway implementing ExchangeGateway.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::application::ports::{ExchangeGateway, GatewayError, LeverageAck};
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderRequest, OrderResponse, OrderType};
use crate::domain::position::Position;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};

use super::api_types::{
    AssetBalance, BinanceOrder, ExchangeInfoResponse, LeverageResponse, PositionRisk,
    PremiumIndexResponse,
};
use super::config::{BinanceConfig, BinanceEnvironment};
use super::error::BinanceError;
use super::http_client::{BinanceHttpClient, Idempotency};

const EXCHANGE_INFO: &str = "/fapi/v1/exchangeInfo";
const PREMIUM_INDEX: &str = "/fapi/v1/premiumIndex";
const LEVERAGE: &str = "/fapi/v1/leverage";
const ORDER: &str = "/fapi/v1/order";
const OPEN_ORDERS: &str = "/fapi/v1/openOrders";
const ALL_OPEN_ORDERS: &str = "/fapi/v1/allOpenOrders";
const POSITION_RISK: &str = "/fapi/v2/positionRisk";
const BALANCE: &str = "/fapi/v2/balance";

/// Binance USDⓈ-M futures gateway.
#[derive(Debug, Clone)]
pub struct BinanceGateway {
    client: BinanceHttpClient,
    environment: BinanceEnvironment,
}

impl BinanceGateway {
    /// Create a new Binance gateway.
    pub fn new(config: BinanceConfig) -> Result<Self, BinanceError> {
        let client = BinanceHttpClient::new(&config)?;
        tracing::info!(
            environment = %config.environment,
            base_url = config.base_url(),
            "Binance gateway ready"
        );
        Ok(Self {
            client,
            environment: config.environment,
        })
    }

    /// Check if orders move real funds.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.environment.is_live()
    }

    /// Build the `POST /fapi/v1/order` parameters.
    fn order_params(request: &OrderRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("symbol", request.symbol.to_string()),
            ("side", request.side.to_string()),
            ("type", request.order_type.to_string()),
            ("quantity", request.quantity.normalize().to_string()),
            ("newClientOrderId", request.client_order_id.to_string()),
            ("newOrderRespType", "RESULT".to_string()),
        ];
        if let Some(price) = request.price {
            params.push(("price", price.normalize().to_string()));
        }
        if request.order_type == OrderType::Limit {
            let tif = request.time_in_force.unwrap_or_default();
            params.push(("timeInForce", tif.to_string()));
        }
        if request.reduce_only {
            params.push(("reduceOnly", "true".to_string()));
        }
        params
    }

    fn symbol_param(symbol: &Symbol) -> Vec<(&'static str, String)> {
        vec![("symbol", symbol.to_string())]
    }
}

#[async_trait]
impl ExchangeGateway for BinanceGateway {
    async fn get_symbol_rules(&self, symbol: &Symbol) -> Result<SymbolRules, GatewayError> {
        let info: ExchangeInfoResponse = self.client.get_public(EXCHANGE_INFO, &[]).await?;

        let info = info
            .symbols
            .into_iter()
            .find(|s| s.symbol == symbol.as_str())
            .ok_or_else(|| GatewayError::UnknownSymbol {
                symbol: symbol.to_string(),
            })?;

        if let Some(status) = info.status.as_deref()
            && status != "TRADING"
        {
            tracing::warn!(symbol = %symbol, status, "Symbol is not trading");
        }

        Ok(info.into_rules()?)
    }

    async fn set_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> Result<LeverageAck, GatewayError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("leverage", leverage.value().to_string()),
        ];
        // Setting the same leverage twice has no further effect, so this POST
        // may be retried.
        let response: LeverageResponse = self
            .client
            .post_signed(LEVERAGE, &params, Idempotency::Idempotent)
            .await?;

        Ok(LeverageAck {
            symbol: Symbol::new(response.symbol),
            leverage: Leverage::new(response.leverage),
            max_notional_value: response.max_notional_value,
        })
    }

    async fn get_mark_price(&self, symbol: &Symbol) -> Result<Decimal, GatewayError> {
        let response: PremiumIndexResponse = self
            .client
            .get_public(PREMIUM_INDEX, &Self::symbol_param(symbol))
            .await?;
        Ok(response.mark_price)
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        if self.is_live() {
            tracing::warn!(
                client_order_id = %request.client_order_id,
                symbol = %request.symbol,
                "Submitting MAINNET order, this trades real funds"
            );
        }

        let params = Self::order_params(request);
        let order: BinanceOrder = self
            .client
            .post_signed(ORDER, &params, Idempotency::SendOnce)
            .await
            .map_err(|err| {
                if err.outcome_unknown() {
                    GatewayError::OutcomeUnknown {
                        client_order_id: request.client_order_id.to_string(),
                        message: err.to_string(),
                    }
                } else {
                    GatewayError::from(err)
                }
            })?;

        // The order exists at this point; a malformed body is still an unknown outcome.
        OrderResponse::try_from(order).map_err(|err| GatewayError::OutcomeUnknown {
            client_order_id: request.client_order_id.to_string(),
            message: err.to_string(),
        })
    }

    async fn get_positions(&self, symbol: &Symbol) -> Result<Vec<Position>, GatewayError> {
        let risks: Vec<PositionRisk> = self
            .client
            .get_signed(POSITION_RISK, &Self::symbol_param(symbol))
            .await?;

        risks
            .into_iter()
            .map(|risk| Position::try_from(risk).map_err(GatewayError::from))
            .collect()
    }

    async fn get_available_balance(&self, asset: &str) -> Result<Decimal, GatewayError> {
        let balances: Vec<AssetBalance> = self.client.get_signed(BALANCE, &[]).await?;
        Ok(balances
            .into_iter()
            .find(|b| b.asset.eq_ignore_ascii_case(asset))
            .map_or(Decimal::ZERO, |b| b.available_balance))
    }

    async fn get_open_orders(
        &self,
        symbol: Option<Symbol>,
    ) -> Result<Vec<OrderResponse>, GatewayError> {
        let params = symbol.as_ref().map(Self::symbol_param).unwrap_or_default();
        let orders: Vec<BinanceOrder> = self.client.get_signed(OPEN_ORDERS, &params).await?;

        orders
            .into_iter()
            .map(|order| OrderResponse::try_from(order).map_err(GatewayError::from))
            .collect()
    }

    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: ExchangeOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("orderId", order_id.value().to_string()),
        ];
        let order: BinanceOrder = self.client.delete_signed(ORDER, &params).await?;
        Ok(OrderResponse::try_from(order)?)
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<(), GatewayError> {
        let _: serde_json::Value = self
            .client
            .delete_signed(ALL_OPEN_ORDERS, &Self::symbol_param(symbol))
            .await?;
        Ok(())
    }

    async fn query_order(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        let params = [
            ("symbol", symbol.to_string()),
            ("origClientOrderId", client_order_id.to_string()),
        ];
        let order: BinanceOrder = self.client.get_signed(ORDER, &params).await?;
        Ok(OrderResponse::try_from(order)?)
    }
}
