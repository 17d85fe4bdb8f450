//! Leverage value object.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Initial leverage multiplier for a futures symbol.
///
/// Zero is representable so that configuration mistakes reach the leverage
/// step and fail there with a leverage error instead of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Leverage(u32);

impl Leverage {
    /// Create a new leverage value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Get the raw multiplier.
    #[must_use]
    pub const fn value(&self) -> u32 {
        self.0
    }

    /// Check if the multiplier is usable (at least 1x).
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 >= 1
    }
}

impl fmt::Display for Leverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

impl From<u32> for Leverage {
    fn from(value: u32) -> Self {
        Self(value)
    }
}
