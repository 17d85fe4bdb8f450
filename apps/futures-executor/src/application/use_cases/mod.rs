//! Application Use Cases
//!
//! Use cases orchestrate domain logic and the exchange gateway.

mod manage_orders;
mod open_position;
mod reconcile;
mod set_leverage;
mod submit_order;

pub use manage_orders::OpenOrdersManager;
pub use open_position::{DEFAULT_SETTLE_DELAY, MARGIN_ASSET, OrderWorkflow};
pub use reconcile::{PositionReconciler, ReconciliationReport};
pub use set_leverage::LeverageManager;
pub use submit_order::OrderSubmitter;
