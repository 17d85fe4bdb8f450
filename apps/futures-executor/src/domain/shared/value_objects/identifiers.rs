//! Strongly-typed identifiers for orders.
//!
//! These prevent mixing up the caller's correlation id with the id the
//! exchange assigns.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix for generated client order ids.
const CLIENT_ORDER_ID_PREFIX: &str = "fx-";

/// Maximum client order id length accepted by the exchange.
pub const MAX_CLIENT_ORDER_ID_LEN: usize = 36;

/// Caller-assigned correlation id for one order attempt.
///
/// A fresh id must be generated for every submission attempt; reusing one
/// lets the exchange reject a duplicate instead of opening a second position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create an identifier from an existing string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a new unique identifier using UUID v4.
    ///
    /// The simple (hyphen-free) form keeps the id within the exchange's
    /// 36 character limit.
    #[must_use]
    pub fn generate() -> Self {
        Self(format!(
            "{CLIENT_ORDER_ID_PREFIX}{}",
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ClientOrderId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClientOrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Exchange-assigned numeric order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeOrderId(i64);

impl ExchangeOrderId {
    /// Wrap a raw exchange id.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExchangeOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
