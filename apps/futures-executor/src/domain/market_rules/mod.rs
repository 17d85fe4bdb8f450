//! Market Rules Bounded Context
//!
//! Exchange-reported constraints (precision, tick/step grids, bounds,
//! minimum notional) that every order must satisfy.

pub mod symbol_rules;

pub use symbol_rules::SymbolRules;
