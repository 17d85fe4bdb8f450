//! Symbol rules cache in front of another gateway.
//!
//! Trading rules change rarely, so repeated runs within the TTL reuse one
//! `exchangeInfo` fetch. Every other call passes straight through: mark
//! prices, positions and order state are never cached.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::application::ports::{ExchangeGateway, GatewayError, LeverageAck};
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderRequest, OrderResponse};
use crate::domain::position::Position;
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};

/// Gateway wrapper that caches symbol rules for a fixed TTL.
#[derive(Debug)]
pub struct CachingGateway<G> {
    inner: G,
    ttl: Duration,
    rules: Mutex<HashMap<Symbol, (Instant, SymbolRules)>>,
}

impl<G: ExchangeGateway> CachingGateway<G> {
    /// Wrap a gateway. A zero TTL disables caching.
    pub fn new(inner: G, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            rules: Mutex::new(HashMap::new()),
        }
    }

    /// The wrapped gateway.
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    /// Drop every cached entry.
    pub fn invalidate(&self) {
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached(&self, symbol: &Symbol) -> Option<SymbolRules> {
        let rules = self.rules.lock().unwrap_or_else(PoisonError::into_inner);
        rules
            .get(symbol)
            .filter(|(fetched_at, _)| fetched_at.elapsed() < self.ttl)
            .map(|(_, rules)| rules.clone())
    }
}

#[async_trait]
impl<G: ExchangeGateway> ExchangeGateway for CachingGateway<G> {
    async fn get_symbol_rules(&self, symbol: &Symbol) -> Result<SymbolRules, GatewayError> {
        if self.ttl.is_zero() {
            return self.inner.get_symbol_rules(symbol).await;
        }
        if let Some(rules) = self.cached(symbol) {
            tracing::debug!(symbol = %symbol, "Symbol rules served from cache");
            return Ok(rules);
        }

        let rules = self.inner.get_symbol_rules(symbol).await?;
        self.rules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(symbol.clone(), (Instant::now(), rules.clone()));
        Ok(rules)
    }

    async fn set_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> Result<LeverageAck, GatewayError> {
        self.inner.set_leverage(symbol, leverage).await
    }

    async fn get_mark_price(&self, symbol: &Symbol) -> Result<Decimal, GatewayError> {
        self.inner.get_mark_price(symbol).await
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        self.inner.submit_order(request).await
    }

    async fn get_positions(&self, symbol: &Symbol) -> Result<Vec<Position>, GatewayError> {
        self.inner.get_positions(symbol).await
    }

    async fn get_available_balance(&self, asset: &str) -> Result<Decimal, GatewayError> {
        self.inner.get_available_balance(asset).await
    }

    async fn get_open_orders(
        &self,
        symbol: Option<Symbol>,
    ) -> Result<Vec<OrderResponse>, GatewayError> {
        self.inner.get_open_orders(symbol).await
    }

    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: ExchangeOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        self.inner.cancel_order(symbol, order_id).await
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<(), GatewayError> {
        self.inner.cancel_all_orders(symbol).await
    }

    async fn query_order(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        self.inner.query_order(symbol, client_order_id).await
    }
}
