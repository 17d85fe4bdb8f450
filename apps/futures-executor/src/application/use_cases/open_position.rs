//! Open Position Use Case
//!
//! Runs one position-opening attempt through the workflow stages:
//!
//! 1. Load and validate the symbol's trading rules
//! 2. Optionally check the USDT balance, then set leverage
//! 3. Read the mark price and derive the order quantity (and LIMIT price)
//! 4. Submit exactly one order with a fresh client order id
//! 5. Read positions back
//!
//! Any failure ends the attempt in `FAILED`. Nothing is retried here; the
//! caller decides whether to start a new attempt.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;

use super::{LeverageManager, OrderSubmitter, PositionReconciler};
use crate::application::dto::{WorkflowFailure, WorkflowParams, WorkflowReport};
use crate::application::ports::ExchangeGateway;
use crate::domain::market_rules::SymbolRules;
use crate::domain::order_execution::{OrderRequest, OrderResponse, OrderType};
use crate::domain::shared::ClientOrderId;
use crate::domain::sizing::{LimitPricer, QuantityCalculator, QuantityComputation};
use crate::domain::workflow::{WorkflowState, WorkflowStateMachine};
use crate::error::ExecutionError;
use crate::observability::{record_gateway_request, record_workflow_run};

/// Asset the balance pre-check reads.
pub const MARGIN_ASSET: &str = "USDT";

/// Default wait between submission and reading positions.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Tracks the current stage and the stages visited so far.
struct Progress {
    state: WorkflowState,
    history: Vec<WorkflowState>,
    client_order_id: Option<ClientOrderId>,
    order: Option<OrderResponse>,
}

impl Progress {
    fn new() -> Self {
        Self {
            state: WorkflowState::Init,
            history: vec![WorkflowState::Init],
            client_order_id: None,
            order: None,
        }
    }

    fn advance(&mut self, to: WorkflowState) -> Result<(), ExecutionError> {
        WorkflowStateMachine::validate_transition(self.state, to)?;
        tracing::debug!(from = %self.state, to = %to, "Workflow transition");
        self.state = to;
        self.history.push(to);
        Ok(())
    }

    fn fail(mut self, error: ExecutionError) -> WorkflowFailure {
        let state_reached = self.state;
        if WorkflowStateMachine::is_valid_transition(self.state, WorkflowState::Failed) {
            self.history.push(WorkflowState::Failed);
        }
        WorkflowFailure {
            state_reached,
            error,
            client_order_id: self.client_order_id,
            order: self.order,
            history: self.history,
        }
    }
}

/// Orchestrates the rules, leverage, sizing, submission and reconciliation
/// steps for one order.
pub struct OrderWorkflow<G>
where
    G: ExchangeGateway,
{
    gateway: Arc<G>,
    calculator: QuantityCalculator,
    pricer: LimitPricer,
    settle_delay: Duration,
}

impl<G> OrderWorkflow<G>
where
    G: ExchangeGateway,
{
    /// Create a workflow with the default LIMIT offset and settle delay.
    pub fn new(gateway: Arc<G>) -> Self {
        Self {
            gateway,
            calculator: QuantityCalculator::new(),
            pricer: LimitPricer::default(),
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }

    /// Wait `delay` after submission before reading positions.
    #[must_use]
    pub const fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Use a custom LIMIT pricer.
    #[must_use]
    pub const fn with_limit_pricer(mut self, pricer: LimitPricer) -> Self {
        self.pricer = pricer;
        self
    }

    /// Run one attempt.
    ///
    /// # Errors
    ///
    /// Returns a [`WorkflowFailure`] carrying the last state reached and the
    /// originating error. If the order was accepted before the failure, the
    /// failure carries the exchange response.
    pub async fn run(&self, params: &WorkflowParams) -> Result<WorkflowReport, WorkflowFailure> {
        let started = Instant::now();
        tracing::info!(
            symbol = %params.symbol,
            leverage = %params.leverage,
            side = %params.side,
            order_type = %params.order_type,
            usdt_amount = %params.usdt_amount,
            reduce_only = params.reduce_only,
            "Starting position workflow"
        );

        let mut progress = Progress::new();
        let result = self.execute(params, &mut progress).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(report) => {
                record_workflow_run("reconciled", &progress.state.to_string(), elapsed);
                tracing::info!(
                    symbol = %params.symbol,
                    client_order_id = %report.client_order_id,
                    order_id = %report.order.order_id,
                    status = %report.order.status,
                    quantity = %report.computation.quantity,
                    "Position workflow complete"
                );
                Ok(report)
            }
            Err(error) => {
                let failure = progress.fail(error);
                record_workflow_run("failed", &failure.state_reached.to_string(), elapsed);
                if failure.order_may_exist() {
                    tracing::error!(
                        symbol = %params.symbol,
                        state = %failure.state_reached,
                        client_order_id = ?failure.client_order_id.as_ref().map(ClientOrderId::as_str),
                        error = %failure.error,
                        "Position workflow failed, an order may exist on the exchange"
                    );
                } else {
                    tracing::error!(
                        symbol = %params.symbol,
                        state = %failure.state_reached,
                        code = %failure.error.code(),
                        error = %failure.error,
                        "Position workflow failed"
                    );
                }
                Err(failure)
            }
        }
    }

    async fn execute(
        &self,
        params: &WorkflowParams,
        progress: &mut Progress,
    ) -> Result<WorkflowReport, ExecutionError> {
        Self::validate_params(params)?;

        // INIT -> RULES_LOADED
        let rules = self.load_rules(params).await?;
        progress.advance(WorkflowState::RulesLoaded)?;

        // RULES_LOADED -> LEVERAGE_SET
        if params.check_balance {
            self.check_balance(params.usdt_amount).await?;
        }
        let leverage = LeverageManager::new(Arc::clone(&self.gateway))
            .set_leverage(&params.symbol, params.leverage)
            .await?;
        progress.advance(WorkflowState::LeverageSet)?;

        // LEVERAGE_SET -> QUANTITY_COMPUTED
        let (reference_price, limit_price, computation) = self.size(params, &rules).await?;
        progress.advance(WorkflowState::QuantityComputed)?;

        // QUANTITY_COMPUTED -> SUBMITTED
        let client_order_id = ClientOrderId::generate();
        progress.client_order_id = Some(client_order_id.clone());
        let request = Self::build_request(
            params,
            client_order_id.clone(),
            computation.quantity,
            limit_price,
        );
        let order = OrderSubmitter::new(Arc::clone(&self.gateway))
            .submit(&request, &rules)
            .await?;
        progress.order = Some(order.clone());
        progress.advance(WorkflowState::Submitted)?;

        // SUBMITTED -> RECONCILED
        let reconciliation = PositionReconciler::new(Arc::clone(&self.gateway))
            .with_settle_delay(self.settle_delay)
            .reconcile(&params.symbol)
            .await?;
        progress.advance(WorkflowState::Reconciled)?;

        Ok(WorkflowReport {
            client_order_id,
            rules,
            leverage,
            reference_price,
            computation,
            order,
            reconciliation,
            history: progress.history.clone(),
        })
    }

    fn validate_params(params: &WorkflowParams) -> Result<(), ExecutionError> {
        params.symbol.validate()?;
        if params.usdt_amount <= Decimal::ZERO {
            return Err(ExecutionError::InvalidInput {
                message: format!("USDT amount must be positive, got {}", params.usdt_amount),
            });
        }
        if !params.order_type.is_supported_entry() {
            return Err(ExecutionError::InvalidInput {
                message: format!(
                    "Order type {} is not supported, use MARKET or LIMIT",
                    params.order_type
                ),
            });
        }
        Ok(())
    }

    async fn load_rules(&self, params: &WorkflowParams) -> Result<SymbolRules, ExecutionError> {
        let started = Instant::now();
        let rules = match self.gateway.get_symbol_rules(&params.symbol).await {
            Ok(rules) => {
                record_gateway_request("get_symbol_rules", "ok", started.elapsed().as_secs_f64());
                rules
            }
            Err(err) => {
                let err = ExecutionError::from_gateway("get_symbol_rules", err);
                record_gateway_request(
                    "get_symbol_rules",
                    err.code().reason(),
                    started.elapsed().as_secs_f64(),
                );
                return Err(err);
            }
        };

        rules.validate()?;
        if rules.symbol != params.symbol {
            return Err(ExecutionError::InvalidRules {
                message: format!(
                    "Rules returned for {} while loading {}",
                    rules.symbol, params.symbol
                ),
            });
        }

        tracing::info!(
            symbol = %rules.symbol,
            price_precision = rules.price_precision,
            quantity_precision = rules.quantity_precision,
            tick_size = %rules.tick_size,
            step_size = %rules.step_size,
            min_qty = %rules.min_qty,
            min_notional = %rules.min_notional,
            "Symbol rules loaded"
        );
        Ok(rules)
    }

    async fn check_balance(&self, required: Decimal) -> Result<(), ExecutionError> {
        let started = Instant::now();
        let available = self
            .gateway
            .get_available_balance(MARGIN_ASSET)
            .await
            .map_err(|e| ExecutionError::from_gateway("get_available_balance", e))?;
        record_gateway_request("get_available_balance", "ok", started.elapsed().as_secs_f64());

        tracing::info!(asset = MARGIN_ASSET, available = %available, required = %required, "Balance");
        if available < required {
            return Err(ExecutionError::InsufficientBalance {
                required,
                available,
            });
        }
        Ok(())
    }

    /// Returns the reference price, the LIMIT price (if any) and the quantity.
    async fn size(
        &self,
        params: &WorkflowParams,
        rules: &SymbolRules,
    ) -> Result<(Decimal, Option<Decimal>, QuantityComputation), ExecutionError> {
        let started = Instant::now();
        let mark_price = match self.gateway.get_mark_price(&params.symbol).await {
            Ok(price) => {
                record_gateway_request("get_mark_price", "ok", started.elapsed().as_secs_f64());
                price
            }
            Err(err) => {
                let err = ExecutionError::from_gateway("get_mark_price", err);
                record_gateway_request(
                    "get_mark_price",
                    err.code().reason(),
                    started.elapsed().as_secs_f64(),
                );
                return Err(err);
            }
        };
        tracing::info!(symbol = %params.symbol, mark_price = %mark_price, "Mark price");

        // LIMIT orders are sized at their own price so the resting order's
        // notional never exceeds the amount either.
        let limit_price = match params.order_type {
            OrderType::Limit => Some(self.pricer.limit_price(params.side, mark_price, rules)?),
            _ => None,
        };
        let reference_price = limit_price.unwrap_or(mark_price);

        let computation = self.calculator.compute_quantity_for(
            params.order_type,
            params.usdt_amount,
            reference_price,
            rules,
        )?;
        tracing::info!(
            usdt_amount = %params.usdt_amount,
            reference_price = %reference_price,
            raw_quantity = %computation.raw_quantity,
            quantity = %computation.quantity,
            notional = %computation.notional,
            capped = computation.capped,
            "Quantity computed"
        );

        Ok((reference_price, limit_price, computation))
    }

    fn build_request(
        params: &WorkflowParams,
        client_order_id: ClientOrderId,
        quantity: Decimal,
        limit_price: Option<Decimal>,
    ) -> OrderRequest {
        let request = match limit_price {
            Some(price) => OrderRequest::limit(
                client_order_id,
                params.symbol.clone(),
                params.side,
                quantity,
                price,
            ),
            None => OrderRequest::market(
                client_order_id,
                params.symbol.clone(),
                params.side,
                quantity,
            ),
        };
        request.with_reduce_only(params.reduce_only)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::Sequence;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::ports::{GatewayError, LeverageAck, MockExchangeGateway};
    use crate::domain::market_rules::symbol_rules::fixtures::btcusdt;
    use crate::domain::order_execution::{OrderSide, OrderStatus};
    use crate::domain::position::snapshot::fixtures::btc_long;
    use crate::domain::shared::{ExchangeOrderId, Leverage, Symbol};
    use crate::error::ErrorCode;

    const MARK: Decimal = dec!(67398.54374468);

    fn params(usdt_amount: Decimal) -> WorkflowParams {
        WorkflowParams::market(
            Symbol::new("BTCUSDT"),
            Leverage::new(20),
            OrderSide::Buy,
            usdt_amount,
        )
    }

    fn filled(request: &OrderRequest) -> OrderResponse {
        OrderResponse {
            order_id: ExchangeOrderId::new(1),
            client_order_id: request.client_order_id.clone(),
            symbol: request.symbol.clone(),
            side: request.side,
            order_type: request.order_type,
            status: OrderStatus::Filled,
            orig_qty: request.quantity,
            executed_qty: request.quantity,
            cum_quote: request.quantity * MARK,
            avg_price: MARK,
            price: request.price.unwrap_or(Decimal::ZERO),
            reduce_only: request.reduce_only,
            update_time: Utc::now(),
        }
    }

    fn happy_gateway() -> MockExchangeGateway {
        let mut gateway = MockExchangeGateway::new();
        let mut seq = Sequence::new();
        gateway
            .expect_get_symbol_rules()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(btcusdt()));
        gateway
            .expect_set_leverage()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|symbol, leverage| {
                Ok(LeverageAck {
                    symbol: symbol.clone(),
                    leverage,
                    max_notional_value: None,
                })
            });
        gateway
            .expect_get_mark_price()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(MARK));
        gateway
            .expect_submit_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|request| Ok(filled(request)));
        gateway
            .expect_get_positions()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(vec![btc_long()]));
        gateway
    }

    fn workflow(gateway: MockExchangeGateway) -> OrderWorkflow<MockExchangeGateway> {
        OrderWorkflow::new(Arc::new(gateway)).with_settle_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn happy_path_visits_every_state_in_order() {
        let report = workflow(happy_gateway()).run(&params(dec!(200))).await.unwrap();

        assert_eq!(report.history, WorkflowState::SEQUENCE.to_vec());
        assert_eq!(report.computation.quantity, dec!(0.002));
        assert_eq!(report.order.status, OrderStatus::Filled);
        assert_eq!(report.order.client_order_id, report.client_order_id);
        assert!(!report.reconciliation.is_flat());
    }

    #[tokio::test]
    async fn below_min_notional_fails_before_submission() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|_| Ok(btcusdt()));
        gateway.expect_set_leverage().returning(|symbol, leverage| {
            Ok(LeverageAck {
                symbol: symbol.clone(),
                leverage,
                max_notional_value: None,
            })
        });
        gateway.expect_get_mark_price().returning(|_| Ok(MARK));
        gateway.expect_submit_order().times(0);
        gateway.expect_get_positions().times(0);

        let failure = workflow(gateway).run(&params(dec!(100))).await.unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::LeverageSet);
        assert_eq!(failure.error.code(), ErrorCode::BelowMinNotional);
        assert_eq!(failure.history.last(), Some(&WorkflowState::Failed));
        assert!(failure.order.is_none());
        assert!(!failure.order_may_exist());
    }

    #[tokio::test]
    async fn unknown_symbol_fails_at_init() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|symbol| {
            Err(GatewayError::UnknownSymbol {
                symbol: symbol.to_string(),
            })
        });
        gateway.expect_set_leverage().times(0);

        let mut p = params(dec!(200));
        p.symbol = Symbol::new("FOOBAR");
        let failure = workflow(gateway).run(&p).await.unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::Init);
        assert_eq!(failure.error.code(), ErrorCode::UnknownSymbol);
        assert_eq!(
            failure.history,
            vec![WorkflowState::Init, WorkflowState::Failed]
        );
    }

    #[tokio::test]
    async fn non_positive_amount_makes_no_gateway_calls() {
        let gateway = MockExchangeGateway::new();
        let failure = workflow(gateway).run(&params(dec!(0))).await.unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::Init);
        assert_eq!(failure.error.code(), ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn insufficient_balance_stops_before_leverage() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|_| Ok(btcusdt()));
        gateway
            .expect_get_available_balance()
            .withf(|asset| asset == MARGIN_ASSET)
            .returning(|_| Ok(dec!(50)));
        gateway.expect_set_leverage().times(0);

        let failure = workflow(gateway)
            .run(&params(dec!(200)).with_balance_check(true))
            .await
            .unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::RulesLoaded);
        assert_eq!(
            failure.error,
            ExecutionError::InsufficientBalance {
                required: dec!(200),
                available: dec!(50)
            }
        );
    }

    #[tokio::test]
    async fn outcome_unknown_keeps_client_order_id() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|_| Ok(btcusdt()));
        gateway.expect_set_leverage().returning(|symbol, leverage| {
            Ok(LeverageAck {
                symbol: symbol.clone(),
                leverage,
                max_notional_value: None,
            })
        });
        gateway.expect_get_mark_price().returning(|_| Ok(MARK));
        gateway.expect_submit_order().times(1).returning(|_| {
            Err(GatewayError::OutcomeUnknown {
                client_order_id: String::new(),
                message: "timed out".to_string(),
            })
        });
        gateway.expect_get_positions().times(0);

        let failure = workflow(gateway).run(&params(dec!(200))).await.unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::QuantityComputed);
        assert!(failure.order_may_exist());
        let id = failure.client_order_id.clone().unwrap();
        match failure.error {
            ExecutionError::SubmissionOutcomeUnknown {
                client_order_id, ..
            } => assert_eq!(client_order_id, id.as_str()),
            other => panic!("expected SubmissionOutcomeUnknown, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reconciliation_failure_exposes_the_order() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|_| Ok(btcusdt()));
        gateway.expect_set_leverage().returning(|symbol, leverage| {
            Ok(LeverageAck {
                symbol: symbol.clone(),
                leverage,
                max_notional_value: None,
            })
        });
        gateway.expect_get_mark_price().returning(|_| Ok(MARK));
        gateway
            .expect_submit_order()
            .returning(|request| Ok(filled(request)));
        gateway.expect_get_positions().returning(|_| {
            Err(GatewayError::Unavailable {
                message: "502".to_string(),
            })
        });

        let failure = workflow(gateway).run(&params(dec!(200))).await.unwrap_err();

        assert_eq!(failure.state_reached, WorkflowState::Submitted);
        assert_eq!(failure.error.code(), ErrorCode::GatewayUnavailable);
        assert_eq!(failure.order.map(|o| o.status), Some(OrderStatus::Filled));
    }

    #[tokio::test]
    async fn limit_order_is_priced_below_mark_for_buys() {
        let mut gateway = MockExchangeGateway::new();
        gateway.expect_get_symbol_rules().returning(|_| Ok(btcusdt()));
        gateway.expect_set_leverage().returning(|symbol, leverage| {
            Ok(LeverageAck {
                symbol: symbol.clone(),
                leverage,
                max_notional_value: None,
            })
        });
        gateway.expect_get_mark_price().returning(|_| Ok(MARK));
        gateway
            .expect_submit_order()
            .withf(|request| {
                request.order_type == OrderType::Limit && request.price == Some(dec!(66724.5))
            })
            .returning(|request| {
                Ok(OrderResponse {
                    status: OrderStatus::New,
                    executed_qty: Decimal::ZERO,
                    ..filled(request)
                })
            });
        gateway.expect_get_positions().returning(|_| Ok(vec![]));

        let report = workflow(gateway)
            .run(&params(dec!(200)).with_order_type(OrderType::Limit))
            .await
            .unwrap();

        assert_eq!(report.reference_price, dec!(66724.5));
        assert_eq!(report.computation.quantity, dec!(0.002));
        assert!(report.reconciliation.is_flat());
    }

    #[tokio::test]
    async fn stop_orders_are_not_accepted() {
        let gateway = MockExchangeGateway::new();
        let failure = workflow(gateway)
            .run(&params(dec!(200)).with_order_type(OrderType::StopMarket))
            .await
            .unwrap_err();

        assert_eq!(failure.error.code(), ErrorCode::InvalidInput);
    }
}
