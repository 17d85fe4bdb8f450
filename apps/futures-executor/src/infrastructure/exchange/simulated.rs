//! In-memory futures exchange.
//!
//! Implements `ExchangeGateway` without network access. MARKET orders fill
//! at the mark price, LIMIT orders fill only when they cross it and rest
//! otherwise. Used for SIMULATED runs and integration tests, with
//! per-operation failure injection and call counters.

use std::collections::{HashMap, VecDeque};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::application::ports::{ExchangeGateway, GatewayError, LeverageAck};
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{
    OrderRequest, OrderResponse, OrderSide, OrderStatus, OrderType,
};
use crate::domain::position::{MarginType, Position};
use crate::domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};

/// Highest leverage accepted when a symbol does not set its own.
pub const DEFAULT_MAX_LEVERAGE: u32 = 125;

/// Gateway operations, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimOperation {
    /// `get_symbol_rules`
    GetSymbolRules,
    /// `set_leverage`
    SetLeverage,
    /// `get_mark_price`
    GetMarkPrice,
    /// `submit_order`
    SubmitOrder,
    /// `get_positions`
    GetPositions,
    /// `get_available_balance`
    GetAvailableBalance,
    /// `get_open_orders`
    GetOpenOrders,
    /// `cancel_order`
    CancelOrder,
    /// `cancel_all_orders`
    CancelAllOrders,
    /// `query_order`
    QueryOrder,
}

#[derive(Debug, Clone)]
struct Market {
    rules: SymbolRules,
    mark_price: Decimal,
    max_leverage: u32,
    leverage: u32,
}

#[derive(Debug, Clone, Default)]
struct Book {
    amount: Decimal,
    entry_price: Decimal,
}

#[derive(Debug, Default)]
struct State {
    markets: HashMap<Symbol, Market>,
    books: HashMap<Symbol, Book>,
    orders: Vec<OrderResponse>,
    balances: HashMap<String, Decimal>,
    next_order_id: i64,
    failures: HashMap<SimOperation, VecDeque<GatewayError>>,
    lose_next_submit_response: bool,
    calls: HashMap<SimOperation, usize>,
}

/// In-memory futures exchange.
#[derive(Debug, Default)]
pub struct SimulatedExchange {
    state: RwLock<State>,
}

impl SimulatedExchange {
    /// Create an exchange with no listed symbols and no balance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an exchange listing BTCUSDT and ETHUSDT with a 10,000 USDT balance.
    #[must_use]
    pub fn with_default_markets() -> Self {
        Self::new()
            .with_symbol(btcusdt_rules(), dec!(67398.54374468))
            .with_symbol(ethusdt_rules(), dec!(3521.17))
            .with_balance("USDT", dec!(10000))
    }

    /// List a symbol at a mark price.
    #[must_use]
    pub fn with_symbol(self, rules: SymbolRules, mark_price: Decimal) -> Self {
        {
            let mut state = self.write();
            state.markets.insert(
                rules.symbol.clone(),
                Market {
                    rules,
                    mark_price,
                    max_leverage: DEFAULT_MAX_LEVERAGE,
                    leverage: 20,
                },
            );
        }
        self
    }

    /// Set an asset's available balance.
    #[must_use]
    pub fn with_balance(self, asset: &str, amount: Decimal) -> Self {
        self.write()
            .balances
            .insert(asset.to_uppercase(), amount);
        self
    }

    /// Set the highest leverage a symbol accepts.
    #[must_use]
    pub fn with_max_leverage(self, symbol: &str, max_leverage: u32) -> Self {
        if let Some(market) = self.write().markets.get_mut(&Symbol::new(symbol)) {
            market.max_leverage = max_leverage;
        }
        self
    }

    /// Move the mark price.
    pub fn set_mark_price(&self, symbol: &str, mark_price: Decimal) {
        if let Some(market) = self.write().markets.get_mut(&Symbol::new(symbol)) {
            market.mark_price = mark_price;
        }
    }

    /// Make the next call to `operation` fail with `error`.
    pub fn fail_next(&self, operation: SimOperation, error: GatewayError) {
        self.write()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Accept the next order but report an unknown outcome, as if the
    /// response was lost in transit.
    pub fn lose_next_submit_response(&self) {
        self.write().lose_next_submit_response = true;
    }

    /// Number of times `operation` was called.
    #[must_use]
    pub fn calls(&self, operation: SimOperation) -> usize {
        self.read().calls.get(&operation).copied().unwrap_or(0)
    }

    /// Every order the exchange accepted, in submission order.
    #[must_use]
    pub fn orders(&self) -> Vec<OrderResponse> {
        self.read().orders.clone()
    }

    /// Leverage currently set for a symbol.
    #[must_use]
    pub fn leverage(&self, symbol: &str) -> Option<Leverage> {
        self.read()
            .markets
            .get(&Symbol::new(symbol))
            .map(|m| Leverage::new(m.leverage))
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call and pop an injected failure, if any.
    fn enter(&self, operation: SimOperation) -> Result<RwLockWriteGuard<'_, State>, GatewayError> {
        let mut state = self.write();
        *state.calls.entry(operation).or_default() += 1;
        if let Some(error) = state
            .failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }
        Ok(state)
    }
}

fn unknown_symbol(symbol: &Symbol) -> GatewayError {
    GatewayError::UnknownSymbol {
        symbol: symbol.to_string(),
    }
}

fn rejected(code: i64, message: impl Into<String>) -> GatewayError {
    GatewayError::Rejected {
        code,
        message: message.into(),
    }
}

impl State {
    fn market(&self, symbol: &Symbol) -> Result<&Market, GatewayError> {
        self.markets.get(symbol).ok_or_else(|| unknown_symbol(symbol))
    }

    /// Exchange-side checks an order must pass.
    fn check_order(&self, request: &OrderRequest, market: &Market) -> Result<(), GatewayError> {
        let rules = &market.rules;
        if self
            .orders
            .iter()
            .any(|o| o.client_order_id == request.client_order_id)
        {
            return Err(rejected(-4116, "ClientOrderId is duplicated."));
        }
        if !request.order_type.is_supported_entry() {
            return Err(rejected(-1116, "Invalid orderType."));
        }
        if request.quantity <= Decimal::ZERO || request.quantity < rules.min_qty {
            return Err(rejected(-4003, "Quantity less than or equal to zero."));
        }
        if !rules.is_step_aligned(request.quantity) || !rules.fits_quantity_precision(request.quantity)
        {
            return Err(rejected(
                -1111,
                "Precision is over the maximum defined for this asset.",
            ));
        }
        if request.quantity > rules.max_qty_for(request.order_type) {
            return Err(rejected(-4005, "Quantity greater than max quantity."));
        }

        let price = match request.order_type {
            OrderType::Limit => request
                .price
                .ok_or_else(|| rejected(-1102, "Mandatory parameter 'price' was not sent."))?,
            _ => market.mark_price,
        };
        if !request.reduce_only && request.quantity * price < rules.min_notional {
            return Err(rejected(
                -4164,
                format!(
                    "Order's notional must be no smaller than {} (unless you choose reduce only).",
                    rules.min_notional.normalize()
                ),
            ));
        }

        if request.reduce_only {
            let held = self
                .books
                .get(&request.symbol)
                .map_or(Decimal::ZERO, |b| b.amount);
            let reduces = match request.side {
                OrderSide::Buy => held < Decimal::ZERO && request.quantity <= -held,
                OrderSide::Sell => held > Decimal::ZERO && request.quantity <= held,
            };
            if !reduces {
                return Err(rejected(-2022, "ReduceOnly Order is rejected."));
            }
        }
        Ok(())
    }

    fn apply_fill(&mut self, symbol: &Symbol, side: OrderSide, quantity: Decimal, price: Decimal) {
        let book = self.books.entry(symbol.clone()).or_default();
        let signed = match side {
            OrderSide::Buy => quantity,
            OrderSide::Sell => -quantity,
        };
        let new_amount = book.amount + signed;

        if book.amount.is_zero() || (book.amount.is_sign_positive() == signed.is_sign_positive()) {
            // Opening or adding: weighted average entry.
            let total = book.amount.abs() + quantity;
            book.entry_price = (book.entry_price * book.amount.abs() + price * quantity) / total;
        } else if new_amount.is_zero() {
            book.entry_price = Decimal::ZERO;
        } else if new_amount.is_sign_positive() != book.amount.is_sign_positive() {
            // Flipped through zero: the remainder opens at the fill price.
            book.entry_price = price;
        }
        book.amount = new_amount;
    }

    fn position(&self, symbol: &Symbol, market: &Market) -> Position {
        let book = self.books.get(symbol).cloned().unwrap_or_default();
        let leverage = Decimal::from(market.leverage.max(1));
        let liquidation_price = if book.amount.is_zero() {
            Decimal::ZERO
        } else if book.amount.is_sign_positive() {
            book.entry_price * (Decimal::ONE - Decimal::ONE / leverage)
        } else {
            book.entry_price * (Decimal::ONE + Decimal::ONE / leverage)
        };

        Position {
            symbol: symbol.clone(),
            position_amt: book.amount,
            entry_price: book.entry_price,
            mark_price: market.mark_price,
            leverage: Leverage::new(market.leverage),
            margin_type: MarginType::Cross,
            liquidation_price: liquidation_price.round_dp(market.rules.price_precision),
            unrealized_profit: (market.mark_price - book.entry_price) * book.amount,
        }
    }
}

#[async_trait]
impl ExchangeGateway for SimulatedExchange {
    async fn get_symbol_rules(&self, symbol: &Symbol) -> Result<SymbolRules, GatewayError> {
        let state = self.enter(SimOperation::GetSymbolRules)?;
        Ok(state.market(symbol)?.rules.clone())
    }

    async fn set_leverage(
        &self,
        symbol: &Symbol,
        leverage: Leverage,
    ) -> Result<LeverageAck, GatewayError> {
        let mut state = self.enter(SimOperation::SetLeverage)?;
        let market = state
            .markets
            .get_mut(symbol)
            .ok_or_else(|| unknown_symbol(symbol))?;

        if leverage.value() == 0 || leverage.value() > market.max_leverage {
            return Err(rejected(
                -4028,
                format!("Leverage {} is not valid", leverage.value()),
            ));
        }
        market.leverage = leverage.value();

        Ok(LeverageAck {
            symbol: symbol.clone(),
            leverage,
            max_notional_value: Some(dec!(80000000) / Decimal::from(leverage.value())),
        })
    }

    async fn get_mark_price(&self, symbol: &Symbol) -> Result<Decimal, GatewayError> {
        let state = self.enter(SimOperation::GetMarkPrice)?;
        Ok(state.market(symbol)?.mark_price)
    }

    async fn submit_order(&self, request: &OrderRequest) -> Result<OrderResponse, GatewayError> {
        let mut state = self.enter(SimOperation::SubmitOrder)?;
        let market = state.market(&request.symbol)?.clone();
        state.check_order(request, &market)?;

        state.next_order_id += 1;
        let order_id = ExchangeOrderId::new(state.next_order_id);

        let fill_price = match request.order_type {
            OrderType::Limit => request.price.filter(|&price| match request.side {
                OrderSide::Buy => price >= market.mark_price,
                OrderSide::Sell => price <= market.mark_price,
            }),
            _ => Some(market.mark_price),
        };

        let response = match fill_price {
            Some(_) => {
                let price = market.mark_price;
                state.apply_fill(&request.symbol, request.side, request.quantity, price);
                OrderResponse {
                    order_id,
                    client_order_id: request.client_order_id.clone(),
                    symbol: request.symbol.clone(),
                    side: request.side,
                    order_type: request.order_type,
                    status: OrderStatus::Filled,
                    orig_qty: request.quantity,
                    executed_qty: request.quantity,
                    cum_quote: request.quantity * price,
                    avg_price: price,
                    price: request.price.unwrap_or(Decimal::ZERO),
                    reduce_only: request.reduce_only,
                    update_time: Utc::now(),
                }
            }
            None => OrderResponse {
                order_id,
                client_order_id: request.client_order_id.clone(),
                symbol: request.symbol.clone(),
                side: request.side,
                order_type: request.order_type,
                status: OrderStatus::New,
                orig_qty: request.quantity,
                executed_qty: Decimal::ZERO,
                cum_quote: Decimal::ZERO,
                avg_price: Decimal::ZERO,
                price: request.price.unwrap_or(Decimal::ZERO),
                reduce_only: request.reduce_only,
                update_time: Utc::now(),
            },
        };
        state.orders.push(response.clone());

        if std::mem::take(&mut state.lose_next_submit_response) {
            return Err(GatewayError::OutcomeUnknown {
                client_order_id: request.client_order_id.to_string(),
                message: "response lost".to_string(),
            });
        }
        Ok(response)
    }

    async fn get_positions(&self, symbol: &Symbol) -> Result<Vec<Position>, GatewayError> {
        let state = self.enter(SimOperation::GetPositions)?;
        let market = state.market(symbol)?;
        Ok(vec![state.position(symbol, market)])
    }

    async fn get_available_balance(&self, asset: &str) -> Result<Decimal, GatewayError> {
        let state = self.enter(SimOperation::GetAvailableBalance)?;
        Ok(state
            .balances
            .get(&asset.to_uppercase())
            .copied()
            .unwrap_or(Decimal::ZERO))
    }

    async fn get_open_orders(
        &self,
        symbol: Option<Symbol>,
    ) -> Result<Vec<OrderResponse>, GatewayError> {
        let state = self.enter(SimOperation::GetOpenOrders)?;
        if let Some(symbol) = &symbol {
            state.market(symbol)?;
        }
        Ok(state
            .orders
            .iter()
            .filter(|o| o.status.is_cancelable())
            .filter(|o| symbol.as_ref().is_none_or(|s| &o.symbol == s))
            .cloned()
            .collect())
    }

    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: ExchangeOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        let mut state = self.enter(SimOperation::CancelOrder)?;
        state.market(symbol)?;
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.symbol == symbol && o.order_id == order_id && o.status.is_cancelable())
            .ok_or_else(|| GatewayError::NotFound {
                message: "Unknown order sent.".to_string(),
            })?;
        order.status = OrderStatus::Canceled;
        order.update_time = Utc::now();
        Ok(order.clone())
    }

    async fn cancel_all_orders(&self, symbol: &Symbol) -> Result<(), GatewayError> {
        let mut state = self.enter(SimOperation::CancelAllOrders)?;
        state.market(symbol)?;
        let now = Utc::now();
        for order in state
            .orders
            .iter_mut()
            .filter(|o| &o.symbol == symbol && o.status.is_cancelable())
        {
            order.status = OrderStatus::Canceled;
            order.update_time = now;
        }
        Ok(())
    }

    async fn query_order(
        &self,
        symbol: &Symbol,
        client_order_id: &ClientOrderId,
    ) -> Result<OrderResponse, GatewayError> {
        let state = self.enter(SimOperation::QueryOrder)?;
        state.market(symbol)?;
        state
            .orders
            .iter()
            .find(|o| &o.symbol == symbol && &o.client_order_id == client_order_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                message: "Order does not exist.".to_string(),
            })
    }
}

/// BTCUSDT perpetual rules.
#[must_use]
pub fn btcusdt_rules() -> SymbolRules {
    SymbolRules {
        symbol: Symbol::new("BTCUSDT"),
        price_precision: 2,
        quantity_precision: 3,
        min_price: dec!(261.10),
        max_price: dec!(809484),
        tick_size: dec!(0.10),
        min_qty: dec!(0.001),
        max_qty: dec!(1000),
        market_max_qty: Some(dec!(120)),
        step_size: dec!(0.001),
        min_notional: dec!(100),
    }
}

/// ETHUSDT perpetual rules.
#[must_use]
pub fn ethusdt_rules() -> SymbolRules {
    SymbolRules {
        symbol: Symbol::new("ETHUSDT"),
        price_precision: 2,
        quantity_precision: 3,
        min_price: dec!(39.86),
        max_price: dec!(306177),
        tick_size: dec!(0.01),
        min_qty: dec!(0.001),
        max_qty: dec!(10000),
        market_max_qty: Some(dec!(2000)),
        step_size: dec!(0.001),
        min_notional: dec!(20),
    }
}
