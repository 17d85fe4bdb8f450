//! Workflow Bounded Context
//!
//! Stages of a single position-opening attempt:
//! `INIT → RULES_LOADED → LEVERAGE_SET → QUANTITY_COMPUTED → SUBMITTED → RECONCILED`,
//! with `FAILED` reachable from every live stage.

pub mod state;
pub mod state_machine;

pub use state::WorkflowState;
pub use state_machine::WorkflowStateMachine;
