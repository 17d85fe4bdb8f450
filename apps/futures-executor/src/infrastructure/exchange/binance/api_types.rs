//! Binance USDⓈ-M futures REST types.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::BinanceError;
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderResponse, OrderSide, OrderStatus, OrderType};
use crate::domain::position::{MarginType, Position};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};

/// Error body returned with non-2xx responses.
#[derive(Debug, Deserialize)]
pub struct BinanceErrorResponse {
    /// Negative error code.
    pub code: i64,
    /// Human-readable message.
    pub msg: String,
}

/// `GET /fapi/v1/exchangeInfo`
#[derive(Debug, Deserialize)]
pub struct ExchangeInfoResponse {
    /// Every listed symbol.
    pub symbols: Vec<SymbolInfo>,
}

/// One symbol from `exchangeInfo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolInfo {
    /// Symbol.
    pub symbol: String,
    /// Trading status (`TRADING`, `SETTLING`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Decimal places for price.
    pub price_precision: u32,
    /// Decimal places for quantity.
    pub quantity_precision: u32,
    /// Trading filters.
    pub filters: Vec<SymbolFilter>,
}

/// Symbol filter, selected by `filterType`.
#[derive(Debug, Deserialize)]
#[serde(tag = "filterType")]
pub enum SymbolFilter {
    /// Price band and tick size.
    #[serde(rename = "PRICE_FILTER", rename_all = "camelCase")]
    Price {
        /// Minimum price.
        min_price: Decimal,
        /// Maximum price.
        max_price: Decimal,
        /// Price increment.
        tick_size: Decimal,
    },
    /// Lot bounds and step for limit orders.
    #[serde(rename = "LOT_SIZE", rename_all = "camelCase")]
    LotSize {
        /// Minimum quantity.
        min_qty: Decimal,
        /// Maximum quantity.
        max_qty: Decimal,
        /// Quantity increment.
        step_size: Decimal,
    },
    /// Lot bounds and step for MARKET orders.
    #[serde(rename = "MARKET_LOT_SIZE", rename_all = "camelCase")]
    MarketLotSize {
        /// Maximum MARKET quantity.
        max_qty: Decimal,
    },
    /// Minimum `quantity × price`.
    #[serde(rename = "MIN_NOTIONAL")]
    MinNotional {
        /// Minimum notional.
        notional: Decimal,
    },
    /// Any filter not used for sizing.
    #[serde(other)]
    Other,
}

impl SymbolInfo {
    /// Build validated rules from the symbol's filters.
    pub fn into_rules(self) -> Result<SymbolRules, BinanceError> {
        let mut price = None;
        let mut lot = None;
        let mut market_max_qty = None;
        let mut min_notional = None;

        for filter in self.filters {
            match filter {
                SymbolFilter::Price {
                    min_price,
                    max_price,
                    tick_size,
                } => price = Some((min_price, max_price, tick_size)),
                SymbolFilter::LotSize {
                    min_qty,
                    max_qty,
                    step_size,
                } => lot = Some((min_qty, max_qty, step_size)),
                SymbolFilter::MarketLotSize { max_qty } => market_max_qty = Some(max_qty),
                SymbolFilter::MinNotional { notional } => min_notional = Some(notional),
                SymbolFilter::Other => {}
            }
        }

        let missing = |name: &str| {
            BinanceError::InvalidResponse(format!("{} has no {name} filter", self.symbol))
        };
        let (min_price, max_price, tick_size) = price.ok_or_else(|| missing("PRICE_FILTER"))?;
        let (min_qty, max_qty, step_size) = lot.ok_or_else(|| missing("LOT_SIZE"))?;
        let min_notional = min_notional.ok_or_else(|| missing("MIN_NOTIONAL"))?;

        Ok(SymbolRules {
            symbol: Symbol::new(self.symbol),
            price_precision: self.price_precision,
            quantity_precision: self.quantity_precision,
            min_price,
            max_price,
            tick_size,
            min_qty,
            max_qty,
            market_max_qty,
            step_size,
            min_notional,
        })
    }
}

/// `GET /fapi/v1/premiumIndex`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumIndexResponse {
    /// Symbol.
    pub symbol: String,
    /// Mark price.
    pub mark_price: Decimal,
}

/// `POST /fapi/v1/leverage`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeverageResponse {
    /// Symbol.
    pub symbol: String,
    /// Confirmed leverage.
    pub leverage: u32,
    /// Maximum position notional at this leverage.
    #[serde(default)]
    pub max_notional_value: Option<Decimal>,
}

/// Order as returned by the order, query, cancel and open-orders endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinanceOrder {
    /// Exchange order id.
    pub order_id: i64,
    /// Client order id.
    pub client_order_id: String,
    /// Symbol.
    pub symbol: String,
    /// Side.
    pub side: OrderSide,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: String,
    /// Status.
    pub status: String,
    /// Ordered quantity.
    pub orig_qty: Decimal,
    /// Filled quantity.
    pub executed_qty: Decimal,
    /// Filled quote amount.
    #[serde(default)]
    pub cum_quote: Decimal,
    /// Average fill price.
    #[serde(default)]
    pub avg_price: Decimal,
    /// Limit price (`0` for market orders).
    #[serde(default)]
    pub price: Decimal,
    /// Reduce-only flag.
    #[serde(default)]
    pub reduce_only: bool,
    /// Last update, epoch milliseconds.
    #[serde(default)]
    pub update_time: i64,
}

impl TryFrom<BinanceOrder> for OrderResponse {
    type Error = BinanceError;

    fn try_from(order: BinanceOrder) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&order.status).ok_or_else(|| {
            BinanceError::InvalidResponse(format!("Unknown order status: {}", order.status))
        })?;
        let order_type = OrderType::parse(&order.order_type).ok_or_else(|| {
            BinanceError::InvalidResponse(format!("Unknown order type: {}", order.order_type))
        })?;

        Ok(Self {
            order_id: ExchangeOrderId::new(order.order_id),
            client_order_id: ClientOrderId::new(order.client_order_id),
            symbol: Symbol::new(order.symbol),
            side: order.side,
            order_type,
            status,
            orig_qty: order.orig_qty,
            executed_qty: order.executed_qty,
            cum_quote: order.cum_quote,
            avg_price: order.avg_price,
            price: order.price,
            reduce_only: order.reduce_only,
            update_time: millis_to_datetime(order.update_time),
        })
    }
}

/// One entry of `GET /fapi/v2/positionRisk`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRisk {
    /// Symbol.
    pub symbol: String,
    /// Signed position size.
    pub position_amt: Decimal,
    /// Average entry price.
    pub entry_price: Decimal,
    /// Mark price.
    pub mark_price: Decimal,
    /// Unrealized PnL.
    #[serde(rename = "unRealizedProfit")]
    pub unrealized_profit: Decimal,
    /// Liquidation price.
    pub liquidation_price: Decimal,
    /// Leverage, sent as a string.
    pub leverage: String,
    /// `cross` or `isolated`.
    pub margin_type: String,
}

impl TryFrom<PositionRisk> for Position {
    type Error = BinanceError;

    fn try_from(risk: PositionRisk) -> Result<Self, Self::Error> {
        let leverage = risk.leverage.trim().parse::<u32>().map_err(|e| {
            BinanceError::InvalidResponse(format!("Invalid leverage {:?}: {e}", risk.leverage))
        })?;
        let margin_type = MarginType::parse(&risk.margin_type).ok_or_else(|| {
            BinanceError::InvalidResponse(format!("Unknown margin type: {}", risk.margin_type))
        })?;

        Ok(Self {
            symbol: Symbol::new(risk.symbol),
            position_amt: risk.position_amt,
            entry_price: risk.entry_price,
            mark_price: risk.mark_price,
            leverage: Leverage::new(leverage),
            margin_type,
            liquidation_price: risk.liquidation_price,
            unrealized_profit: risk.unrealized_profit,
        })
    }
}

/// One entry of `GET /fapi/v2/balance`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    /// Asset.
    pub asset: String,
    /// Wallet balance.
    pub balance: Decimal,
    /// Balance free for new orders.
    pub available_balance: Decimal,
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const EXCHANGE_INFO: &str = r#"{
        "timezone": "UTC",
        "symbols": [{
            "symbol": "BTCUSDT",
            "status": "TRADING",
            "pricePrecision": 2,
            "quantityPrecision": 3,
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "261.10", "maxPrice": "809484", "tickSize": "0.10"},
                {"filterType": "LOT_SIZE", "minQty": "0.001", "maxQty": "1000", "stepSize": "0.001"},
                {"filterType": "MARKET_LOT_SIZE", "minQty": "0.001", "maxQty": "120", "stepSize": "0.001"},
                {"filterType": "MAX_NUM_ORDERS", "limit": 200},
                {"filterType": "MIN_NOTIONAL", "notional": "100"},
                {"filterType": "PERCENT_PRICE", "multiplierUp": "1.0500", "multiplierDown": "0.9500", "multiplierDecimal": "4"}
            ]
        }]
    }"#;

    #[test]
    fn filters_are_selected_by_type() {
        let info: ExchangeInfoResponse = serde_json::from_str(EXCHANGE_INFO).unwrap();
        let rules = info.symbols.into_iter().next().unwrap().into_rules().unwrap();

        assert_eq!(rules.symbol.as_str(), "BTCUSDT");
        assert_eq!(rules.quantity_precision, 3);
        assert_eq!(rules.tick_size, dec!(0.10));
        assert_eq!(rules.step_size, dec!(0.001));
        assert_eq!(rules.max_qty, dec!(1000));
        assert_eq!(rules.market_max_qty, Some(dec!(120)));
        assert_eq!(rules.min_notional, dec!(100));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn missing_filter_is_invalid_response() {
        let json = r#"{"symbol": "XUSDT", "pricePrecision": 2, "quantityPrecision": 0,
            "filters": [{"filterType": "PRICE_FILTER", "minPrice": "1", "maxPrice": "2", "tickSize": "0.01"}]}"#;
        let info: SymbolInfo = serde_json::from_str(json).unwrap();
        let err = info.into_rules().unwrap_err();
        assert!(matches!(err, BinanceError::InvalidResponse(m) if m.contains("LOT_SIZE")));
    }

    #[test]
    fn order_response_converts() {
        let json = r#"{
            "orderId": 4170316434, "clientOrderId": "fx-abc", "symbol": "BTCUSDT",
            "side": "BUY", "type": "MARKET", "status": "FILLED", "positionSide": "BOTH",
            "origQty": "0.002", "executedQty": "0.002", "cumQuote": "134.79700",
            "avgPrice": "67398.50000", "price": "0.00", "reduceOnly": false,
            "timeInForce": "GTC", "updateTime": 1718000000000
        }"#;
        let order: BinanceOrder = serde_json::from_str(json).unwrap();
        let response = OrderResponse::try_from(order).unwrap();

        assert_eq!(response.order_id.value(), 4_170_316_434);
        assert_eq!(response.status, OrderStatus::Filled);
        assert_eq!(response.order_type, OrderType::Market);
        assert_eq!(response.executed_qty, dec!(0.002));
        assert_eq!(response.update_time.timestamp_millis(), 1_718_000_000_000);
    }

    #[test]
    fn position_risk_converts() {
        let json = r#"{
            "symbol": "BTCUSDT", "positionAmt": "-0.002", "entryPrice": "67398.5",
            "markPrice": "67400.1", "unRealizedProfit": "-0.0032", "liquidationPrice": "70500.2",
            "leverage": "20", "maxNotionalValue": "10000000", "marginType": "cross",
            "isolatedMargin": "0.00000000", "isAutoAddMargin": "false", "positionSide": "BOTH"
        }"#;
        let risk: PositionRisk = serde_json::from_str(json).unwrap();
        let position = Position::try_from(risk).unwrap();

        assert_eq!(position.position_amt, dec!(-0.002));
        assert_eq!(position.leverage, Leverage::new(20));
        assert_eq!(position.margin_type, MarginType::Cross);
    }

    #[test]
    fn unknown_status_is_invalid_response() {
        let json = r#"{"orderId": 1, "clientOrderId": "x", "symbol": "BTCUSDT", "side": "SELL",
            "type": "LIMIT", "status": "PENDING_NEW", "origQty": "1", "executedQty": "0"}"#;
        let order: BinanceOrder = serde_json::from_str(json).unwrap();
        assert!(OrderResponse::try_from(order).is_err());
    }
}
