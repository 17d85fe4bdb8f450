//! Position Bounded Context
//!
//! Read-only projection of exchange-side positions.

pub mod snapshot;

pub use snapshot::{MarginType, Position, PositionDirection};
