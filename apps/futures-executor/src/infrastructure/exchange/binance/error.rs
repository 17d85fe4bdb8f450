//! Binance-specific error types.

use thiserror::Error;

use crate::application::ports::GatewayError;

/// Binance error code for an unknown symbol.
pub const CODE_INVALID_SYMBOL: i64 = -1121;
/// Binance error code for an order that does not exist.
pub const CODE_NO_SUCH_ORDER: i64 = -2013;
/// Binance error code for cancelling an unknown order.
pub const CODE_UNKNOWN_ORDER: i64 = -2011;
/// Binance error code for a backend timeout; the request may have executed.
pub const CODE_BACKEND_TIMEOUT: i64 = -1007;

/// Errors from the Binance adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BinanceError {
    /// Connection could not be established; the request never left.
    #[error("Network error: {0}")]
    Network(String),

    /// Request was sent but no complete response arrived.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Exchange returned an error body.
    #[error("API error {code}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Binance error code.
        code: i64,
        /// Binance error message.
        message: String,
    },

    /// Symbol is not listed.
    #[error("Invalid symbol: {symbol}")]
    InvalidSymbol {
        /// Symbol from the request.
        symbol: String,
    },

    /// Order does not exist.
    #[error("Order not found: {message}")]
    OrderNotFound {
        /// Binance error message.
        message: String,
    },

    /// Credentials or signature rejected.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request weight exceeded or IP banned.
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited {
        /// Suggested retry delay in seconds.
        retry_after_secs: u64,
    },

    /// Exchange-side failure (5xx).
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// Response decoded but is missing required data.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Retries exhausted.
    #[error("Max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded {
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last_error: String,
    },
}

impl BinanceError {
    /// Returns true if the request may have been processed by the exchange.
    ///
    /// Only meaningful for non-idempotent requests, which are never retried.
    #[must_use]
    pub const fn outcome_unknown(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Server { .. } | Self::JsonParse(_) | Self::InvalidResponse(_)
        )
    }
}

impl From<BinanceError> for GatewayError {
    fn from(err: BinanceError) -> Self {
        match err {
            BinanceError::InvalidSymbol { symbol } => Self::UnknownSymbol { symbol },
            BinanceError::OrderNotFound { message } => Self::NotFound { message },
            BinanceError::Api { code, message, .. } => Self::Rejected { code, message },
            BinanceError::AuthenticationFailed(_) => Self::AuthenticationFailed,
            BinanceError::RateLimited { .. } => Self::RateLimited,
            BinanceError::Network(message)
            | BinanceError::Timeout(message)
            | BinanceError::JsonParse(message)
            | BinanceError::InvalidResponse(message) => Self::Unavailable { message },
            BinanceError::Server { status, message } => Self::Unavailable {
                message: format!("HTTP {status}: {message}"),
            },
            BinanceError::MaxRetriesExceeded {
                attempts,
                last_error,
            } => Self::Unavailable {
                message: format!("gave up after {attempts} attempts: {last_error}"),
            },
        }
    }
}
