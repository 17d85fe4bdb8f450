//! Integration Tests for the Binance Gateway
//!
//! Exercises the REST adapter against a local mock server: rule parsing,
//! error code mapping, signing, and the retry policy split between reads
//! and order submission.

// Allow unwrap in tests - tests should panic on unexpected errors
#![allow(clippy::unwrap_used)]

use std::time::Duration;

use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use futures_executor::application::ports::{ExchangeGateway, GatewayError};
use futures_executor::domain::order_execution::{OrderRequest, OrderSide, OrderStatus};
use futures_executor::domain::position::MarginType;
use futures_executor::domain::shared::{ClientOrderId, Leverage, Symbol};
use futures_executor::infrastructure::exchange::{
    BinanceConfig, BinanceEnvironment, BinanceGateway, RetryConfig,
};

fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
        multiplier: 2.0,
        jitter: 0.0,
    }
}

fn gateway(server: &MockServer) -> BinanceGateway {
    let config = BinanceConfig::new("test-key", "test-secret", BinanceEnvironment::Testnet)
        .with_base_url(server.uri())
        .with_timeout(Duration::from_millis(500))
        .with_retry(fast_retry());
    BinanceGateway::new(config).unwrap()
}

fn is_signed(request: &Request) -> bool {
    request.url.query_pairs().any(|(k, _)| k == "signature")
        && request.url.query_pairs().any(|(k, _)| k == "timestamp")
}

fn btc() -> Symbol {
    Symbol::new("BTCUSDT")
}

fn market_buy() -> OrderRequest {
    OrderRequest::market(
        ClientOrderId::new("fx-test-1"),
        btc(),
        OrderSide::Buy,
        dec!(0.002),
    )
}

fn exchange_info() -> serde_json::Value {
    json!({
        "timezone": "UTC",
        "serverTime": 1_718_000_000_000_i64,
        "symbols": [{
            "symbol": "BTCUSDT",
            "status": "TRADING",
            "pricePrecision": 2,
            "quantityPrecision": 3,
            "filters": [
                {"filterType": "PRICE_FILTER", "minPrice": "261.10", "maxPrice": "809484", "tickSize": "0.10"},
                {"filterType": "LOT_SIZE", "minQty": "0.001", "maxQty": "1000", "stepSize": "0.001"},
                {"filterType": "MARKET_LOT_SIZE", "minQty": "0.001", "maxQty": "120", "stepSize": "0.001"},
                {"filterType": "MIN_NOTIONAL", "notional": "100"},
                {"filterType": "PERCENT_PRICE", "multiplierUp": "1.0500", "multiplierDown": "0.9500", "multiplierDecimal": "4"}
            ]
        }]
    })
}

fn filled_order() -> serde_json::Value {
    json!({
        "orderId": 4_058_111_234_i64,
        "clientOrderId": "fx-test-1",
        "symbol": "BTCUSDT",
        "side": "BUY",
        "type": "MARKET",
        "status": "FILLED",
        "origQty": "0.002",
        "executedQty": "0.002",
        "cumQuote": "134.79708",
        "avgPrice": "67398.54",
        "price": "0",
        "reduceOnly": false,
        "updateTime": 1_718_000_000_123_i64
    })
}

// =============================================================================
// Symbol rules
// =============================================================================

#[tokio::test]
async fn symbol_rules_come_from_exchange_info_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(exchange_info()))
        .expect(1)
        .mount(&server)
        .await;

    let rules = gateway(&server).get_symbol_rules(&btc()).await.unwrap();

    assert_eq!(rules.step_size, dec!(0.001));
    assert_eq!(rules.tick_size, dec!(0.10));
    assert_eq!(rules.min_notional, dec!(100));
    assert_eq!(rules.quantity_precision, 3);
    assert!(rules.validate().is_ok());
}

#[tokio::test]
async fn unlisted_symbol_is_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/exchangeInfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(exchange_info()))
        .mount(&server)
        .await;

    let err = gateway(&server)
        .get_symbol_rules(&Symbol::new("FOOBAR"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::UnknownSymbol {
            symbol: "FOOBAR".to_string()
        }
    );
}

#[tokio::test]
async fn invalid_symbol_code_maps_to_unknown_symbol() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .and(query_param("symbol", "FOOBAR"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"code": -1121, "msg": "Invalid symbol."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server)
        .get_mark_price(&Symbol::new("FOOBAR"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::UnknownSymbol { symbol } if symbol == "FOOBAR"));
}

// =============================================================================
// Leverage
// =============================================================================

#[tokio::test]
async fn leverage_is_signed_and_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/leverage"))
        .and(header_exists("X-MBX-APIKEY"))
        .and(query_param("leverage", "20"))
        .and(is_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "leverage": 20,
            "maxNotionalValue": "4000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = gateway(&server)
        .set_leverage(&btc(), Leverage::new(20))
        .await
        .unwrap();

    assert_eq!(ack.leverage, Leverage::new(20));
    assert_eq!(ack.max_notional_value, Some(dec!(4000000)));
}

#[tokio::test]
async fn leverage_rejection_is_reported_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/leverage"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -4028, "msg": "Leverage 999 is not valid"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server)
        .set_leverage(&btc(), Leverage::new(999))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        GatewayError::Rejected {
            code: -4028,
            message: "Leverage 999 is not valid".to_string()
        }
    );
}

// =============================================================================
// Retry policy
// =============================================================================

#[tokio::test]
async fn reads_are_retried_after_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "markPrice": "67398.54374468",
            "indexPrice": "67410.10000000"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let price = gateway(&server).get_mark_price(&btc()).await.unwrap();

    assert_eq!(price, dec!(67398.54374468));
}

#[tokio::test]
async fn reads_give_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/premiumIndex"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let err = gateway(&server).get_mark_price(&btc()).await.unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn submit_server_error_is_outcome_unknown_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).submit_order(&market_buy()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::OutcomeUnknown { client_order_id, .. } if client_order_id == "fx-test-1"
    ));
}

#[tokio::test]
async fn submit_timeout_is_outcome_unknown_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(filled_order())
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).submit_order(&market_buy()).await.unwrap_err();

    assert!(matches!(err, GatewayError::OutcomeUnknown { .. }));
}

#[tokio::test]
async fn submit_backend_timeout_is_outcome_unknown_and_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(ResponseTemplate::new(408).set_body_json(json!({
            "code": -1007,
            "msg": "Timeout waiting for response from backend server. Send status unknown; execution status unknown."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).submit_order(&market_buy()).await.unwrap_err();

    assert!(matches!(
        err,
        GatewayError::OutcomeUnknown { client_order_id, .. } if client_order_id == "fx-test-1"
    ));
}

// =============================================================================
// Orders and positions
// =============================================================================

#[tokio::test]
async fn submit_sends_client_order_id_and_parses_fill() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .and(query_param("newClientOrderId", "fx-test-1"))
        .and(query_param("type", "MARKET"))
        .and(query_param("quantity", "0.002"))
        .and(is_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(filled_order()))
        .expect(1)
        .mount(&server)
        .await;

    let order = gateway(&server).submit_order(&market_buy()).await.unwrap();

    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.executed_qty, dec!(0.002));
    assert_eq!(order.client_order_id, ClientOrderId::new("fx-test-1"));
}

#[tokio::test]
async fn business_rejection_on_submit_is_not_outcome_unknown() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fapi/v1/order"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -2019, "msg": "Margin is insufficient."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server).submit_order(&market_buy()).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::Rejected {
            code: -2019,
            message: "Margin is insufficient.".to_string()
        }
    );
}

#[tokio::test]
async fn positions_are_parsed_from_position_risk() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v2/positionRisk"))
        .and(query_param("symbol", "BTCUSDT"))
        .and(is_signed)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "symbol": "BTCUSDT",
            "positionAmt": "0.002",
            "entryPrice": "67398.5",
            "markPrice": "67400.00000000",
            "unRealizedProfit": "0.00300000",
            "liquidationPrice": "64189.7",
            "leverage": "20",
            "maxNotionalValue": "4000000",
            "marginType": "cross",
            "isolatedMargin": "0.00000000",
            "isAutoAddMargin": "false",
            "positionSide": "BOTH",
            "notional": "134.8",
            "isolatedWallet": "0",
            "updateTime": 1_718_000_000_456_i64
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let positions = gateway(&server).get_positions(&btc()).await.unwrap();

    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0].position_amt, dec!(0.002));
    assert_eq!(positions[0].leverage, Leverage::new(20));
    assert_eq!(positions[0].margin_type, MarginType::Cross);
}

#[tokio::test]
async fn unknown_order_lookup_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v1/order"))
        .and(query_param("origClientOrderId", "fx-missing"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"code": -2013, "msg": "Order does not exist."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server)
        .query_order(&btc(), &ClientOrderId::new("fx-missing"))
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::NotFound { .. }));
}

#[tokio::test]
async fn bad_credentials_are_authentication_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fapi/v2/balance"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"code": -2015, "msg": "Invalid API-key, IP, or permissions for action."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = gateway(&server)
        .get_available_balance("USDT")
        .await
        .unwrap_err();

    assert_eq!(err, GatewayError::AuthenticationFailed);
}
