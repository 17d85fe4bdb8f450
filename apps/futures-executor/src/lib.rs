// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Futures Executor - Rust Core Library
//!
//! Opens one leveraged USDⓈ-M futures position per run: load the symbol's
//! trading rules, set leverage, size a USDT notional into an exchange-legal
//! quantity, submit one order and read the position back.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Pure business rules, no I/O
//!   - `market_rules`: `SymbolRules` snapshot and its grids
//!   - `sizing`: `QuantityCalculator`, `LimitPricer`
//!   - `order_execution`: Order requests/responses, local validation
//!   - `position`: Exchange-reported positions
//!   - `workflow`: Attempt state machine
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `ExchangeGateway`
//!   - `use_cases`: `LeverageManager`, `OrderSubmitter`,
//!     `PositionReconciler`, `OpenOrdersManager`, `OrderWorkflow`
//!   - `dto`: Workflow parameters, reports, failures
//!
//! - **Infrastructure**: Adapters
//!   - `exchange::binance`: Binance futures REST gateway
//!   - `exchange`: Simulated exchange, rules cache
//!
//! Cross-cutting: `config` (INI settings), `telemetry` (logging),
//! `observability` (metrics), `error` (taxonomy and exit codes).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Settings loaded from INI files.
pub mod config;

/// Error taxonomy.
pub mod error;

/// Metric recording.
pub mod observability;

/// Logging initialization.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::market_rules::SymbolRules;
pub use domain::order_execution::{
    OrderRequest, OrderResponse, OrderSide, OrderStatus, OrderType, TimeInForce,
};
pub use domain::position::{MarginType, Position, PositionDirection};
pub use domain::shared::{ClientOrderId, ExchangeOrderId, Leverage, Symbol};
pub use domain::sizing::{LimitPricer, QuantityCalculator, QuantityComputation, SizingError};
pub use domain::workflow::WorkflowState;

// Application re-exports
pub use application::dto::{WorkflowFailure, WorkflowParams, WorkflowReport};
pub use application::ports::{ExchangeGateway, GatewayError, LeverageAck};
pub use application::use_cases::{
    LeverageManager, OpenOrdersManager, OrderSubmitter, OrderWorkflow, PositionReconciler,
    ReconciliationReport,
};

// Infrastructure re-exports
pub use infrastructure::exchange::{
    BinanceConfig, BinanceEnvironment, BinanceError, BinanceGateway, CachingGateway,
    SimulatedExchange,
};

// Cross-cutting re-exports
pub use config::{Settings, load_settings};
pub use error::{ErrorCode, ExecutionError};
