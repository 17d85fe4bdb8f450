//! Domain Layer
//!
//! Pure business types and rules. Nothing here performs I/O.
//!
//! # Bounded Contexts
//!
//! - `market_rules`: Exchange trading rules per symbol
//! - `sizing`: Notional to quantity conversion, LIMIT pricing
//! - `order_execution`: Order requests, responses, local validation
//! - `position`: Exchange-reported positions
//! - `workflow`: Stages of one position-opening attempt
//! - `shared`: Identifiers, symbols, leverage, domain errors

pub mod market_rules;
pub mod order_execution;
pub mod position;
pub mod shared;
pub mod sizing;
pub mod workflow;
