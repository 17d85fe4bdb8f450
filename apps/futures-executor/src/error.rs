//! Error taxonomy for a position-opening attempt.
//!
//! Every failure the workflow can surface maps to exactly one
//! [`ExecutionError`] variant, and every variant carries a stable
//! [`ErrorCode`] for logs, metrics and process exit status.
//!
//! # Propagation
//!
//! | Code | Retry policy |
//! |------|--------------|
//! | `GATEWAY_UNAVAILABLE` | Caller may retry read-only steps with backoff |
//! | `SUBMISSION_OUTCOME_UNKNOWN` | Look the order up by client order id first |
//! | everything else | Terminal for the attempt |

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::ports::GatewayError;
use crate::domain::order_execution::OrderError;
use crate::domain::shared::DomainError;
use crate::domain::sizing::SizingError;

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Exchange does not list the symbol.
    UnknownSymbol,
    /// Transport failure or exchange outage.
    GatewayUnavailable,
    /// Leverage rejected for the symbol.
    LeverageOutOfRange,
    /// Local pre-submission check failed.
    InvalidQuantity,
    /// Quantity rounds to zero or below the minimum lot.
    QuantityTooSmall,
    /// Rounded quantity is below the minimum notional.
    BelowMinNotional,
    /// Exchange rejected the order.
    OrderRejected,
    /// Exchange rejected a request that is not an order.
    ExchangeRejected,
    /// Order may or may not exist.
    SubmissionOutcomeUnknown,
    /// Exchange rules snapshot is unusable.
    InvalidRules,
    /// Caller-supplied parameters are unusable.
    InvalidInput,
    /// Not enough margin asset to fund the order.
    InsufficientBalance,
    /// Credentials rejected.
    AuthenticationFailed,
    /// Programming error.
    Internal,
}

impl ErrorCode {
    /// Get the code string used in logs and metric labels.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::UnknownSymbol => "UNKNOWN_SYMBOL",
            Self::GatewayUnavailable => "GATEWAY_UNAVAILABLE",
            Self::LeverageOutOfRange => "LEVERAGE_OUT_OF_RANGE",
            Self::InvalidQuantity => "INVALID_QUANTITY",
            Self::QuantityTooSmall => "QUANTITY_TOO_SMALL",
            Self::BelowMinNotional => "BELOW_MIN_NOTIONAL",
            Self::OrderRejected => "ORDER_REJECTED",
            Self::ExchangeRejected => "EXCHANGE_REJECTED",
            Self::SubmissionOutcomeUnknown => "SUBMISSION_OUTCOME_UNKNOWN",
            Self::InvalidRules => "INVALID_RULES",
            Self::InvalidInput => "INVALID_INPUT",
            Self::InsufficientBalance => "INSUFFICIENT_BALANCE",
            Self::AuthenticationFailed => "AUTHENTICATION_FAILED",
            Self::Internal => "INTERNAL",
        }
    }

    /// Process exit status for the binary.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::GatewayUnavailable => 3,
            Self::SubmissionOutcomeUnknown => 4,
            Self::OrderRejected => 5,
            Self::AuthenticationFailed => 6,
            Self::Internal => 70,
            _ => 2,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Error surfaced by the position-opening use cases.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// Exchange does not list the symbol.
    #[error("Unknown symbol: {symbol}")]
    UnknownSymbol {
        /// Symbol that was requested.
        symbol: String,
    },

    /// Transport failure or exchange outage.
    #[error("Gateway unavailable during {operation}: {message}")]
    GatewayUnavailable {
        /// Step that was running.
        operation: String,
        /// Error details.
        message: String,
    },

    /// Exchange rejected the leverage (or it is zero).
    #[error("Leverage {requested}x out of range for {symbol}: {message}")]
    LeverageOutOfRange {
        /// Symbol.
        symbol: String,
        /// Requested multiplier.
        requested: u32,
        /// Exchange (or local) explanation.
        message: String,
    },

    /// Local pre-submission validation failed.
    #[error("Invalid quantity: {message}")]
    InvalidQuantity {
        /// Which rule was broken.
        message: String,
    },

    /// Quantity rounds to zero or below the minimum lot.
    #[error("Quantity too small: {quantity} (minimum {min_qty})")]
    QuantityTooSmall {
        /// Rounded quantity.
        quantity: Decimal,
        /// Minimum lot.
        min_qty: Decimal,
    },

    /// Rounded quantity's notional is below the exchange floor.
    #[error("Notional {notional} for quantity {quantity} is below minimum {min_notional}")]
    BelowMinNotional {
        /// Rounded quantity.
        quantity: Decimal,
        /// `quantity × price`.
        notional: Decimal,
        /// Exchange floor.
        min_notional: Decimal,
    },

    /// Exchange rejected the order.
    #[error("Order rejected ({code}): {message}")]
    OrderRejected {
        /// Exchange error code.
        code: i64,
        /// Exchange error message.
        message: String,
    },

    /// Exchange rejected a non-order request (rules, prices, positions, balance).
    #[error("Exchange rejected {operation} ({code}): {message}")]
    ExchangeRejected {
        /// Request that was rejected.
        operation: String,
        /// Exchange error code.
        code: i64,
        /// Exchange error message.
        message: String,
    },

    /// Submission may or may not have reached the exchange.
    #[error("Submission outcome unknown for {client_order_id}: {message}")]
    SubmissionOutcomeUnknown {
        /// Correlation id to look the order up by.
        client_order_id: String,
        /// Error details.
        message: String,
    },

    /// Rules snapshot is unusable.
    #[error("{message}")]
    InvalidRules {
        /// Description.
        message: String,
    },

    /// Caller-supplied parameters are unusable.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description.
        message: String,
    },

    /// Not enough margin asset.
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Amount the order needs.
        required: Decimal,
        /// Amount the account has.
        available: Decimal,
    },

    /// Credentials rejected.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Programming error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description.
        message: String,
    },
}

impl ExecutionError {
    /// Stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::UnknownSymbol { .. } => ErrorCode::UnknownSymbol,
            Self::GatewayUnavailable { .. } => ErrorCode::GatewayUnavailable,
            Self::LeverageOutOfRange { .. } => ErrorCode::LeverageOutOfRange,
            Self::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            Self::QuantityTooSmall { .. } => ErrorCode::QuantityTooSmall,
            Self::BelowMinNotional { .. } => ErrorCode::BelowMinNotional,
            Self::OrderRejected { .. } => ErrorCode::OrderRejected,
            Self::ExchangeRejected { .. } => ErrorCode::ExchangeRejected,
            Self::SubmissionOutcomeUnknown { .. } => ErrorCode::SubmissionOutcomeUnknown,
            Self::InvalidRules { .. } => ErrorCode::InvalidRules,
            Self::InvalidInput { .. } => ErrorCode::InvalidInput,
            Self::InsufficientBalance { .. } => ErrorCode::InsufficientBalance,
            Self::AuthenticationFailed => ErrorCode::AuthenticationFailed,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Returns true if the caller may retry the failed read-only step.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::GatewayUnavailable { .. })
    }

    /// Returns true if an order may exist despite the error.
    #[must_use]
    pub const fn is_outcome_unknown(&self) -> bool {
        matches!(self, Self::SubmissionOutcomeUnknown { .. })
    }

    /// Map a gateway error raised while running `operation`.
    ///
    /// Rejections count as order rejections only for order entry and
    /// cancellation.
    #[must_use]
    pub fn from_gateway(operation: &str, err: GatewayError) -> Self {
        match err {
            GatewayError::UnknownSymbol { symbol } => Self::UnknownSymbol { symbol },
            GatewayError::Unavailable { message } => Self::GatewayUnavailable {
                operation: operation.to_string(),
                message,
            },
            GatewayError::RateLimited => Self::GatewayUnavailable {
                operation: operation.to_string(),
                message: "rate limited".to_string(),
            },
            GatewayError::Rejected { code, message } if is_order_operation(operation) => {
                Self::OrderRejected { code, message }
            }
            GatewayError::Rejected { code, message } => Self::ExchangeRejected {
                operation: operation.to_string(),
                code,
                message,
            },
            GatewayError::OutcomeUnknown {
                client_order_id,
                message,
            } => Self::SubmissionOutcomeUnknown {
                client_order_id,
                message,
            },
            GatewayError::AuthenticationFailed => Self::AuthenticationFailed,
            GatewayError::NotFound { message } => Self::InvalidInput { message },
        }
    }
}

fn is_order_operation(operation: &str) -> bool {
    matches!(operation, "submit_order" | "cancel_order" | "cancel_all_orders")
}

impl From<SizingError> for ExecutionError {
    fn from(err: SizingError) -> Self {
        match err {
            SizingError::InvalidInput(message) => Self::InvalidInput { message },
            SizingError::InvalidRules(err) => Self::InvalidRules {
                message: err.to_string(),
            },
            SizingError::QuantityTooSmall {
                quantity, min_qty, ..
            } => Self::QuantityTooSmall { quantity, min_qty },
            SizingError::BelowMinNotional {
                quantity,
                notional,
                min_notional,
            } => Self::BelowMinNotional {
                quantity,
                notional,
                min_notional,
            },
        }
    }
}

impl From<OrderError> for ExecutionError {
    fn from(err: OrderError) -> Self {
        Self::InvalidQuantity {
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for ExecutionError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidRules { .. } => Self::InvalidRules {
                message: err.to_string(),
            },
            DomainError::InvalidValue { .. } => Self::InvalidInput {
                message: err.to_string(),
            },
            DomainError::InvalidStateTransition { .. } => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn only_gateway_unavailable_is_retryable() {
        let unavailable = ExecutionError::GatewayUnavailable {
            operation: "get_mark_price".to_string(),
            message: "connection reset".to_string(),
        };
        assert!(unavailable.is_retryable());

        let unknown = ExecutionError::SubmissionOutcomeUnknown {
            client_order_id: "fx-1".to_string(),
            message: "timeout".to_string(),
        };
        assert!(!unknown.is_retryable());
        assert!(unknown.is_outcome_unknown());
    }

    #[test]
    fn gateway_rejection_is_verbatim() {
        let err = ExecutionError::from_gateway(
            "submit_order",
            GatewayError::Rejected {
                code: -2019,
                message: "Margin is insufficient.".to_string(),
            },
        );
        assert_eq!(
            err,
            ExecutionError::OrderRejected {
                code: -2019,
                message: "Margin is insufficient.".to_string()
            }
        );
    }

    #[test]
    fn read_rejection_is_not_an_order_rejection() {
        for operation in ["get_mark_price", "get_available_balance", "get_positions"] {
            let err = ExecutionError::from_gateway(
                operation,
                GatewayError::Rejected {
                    code: -1102,
                    message: "Mandatory parameter was not sent.".to_string(),
                },
            );
            assert_eq!(err.code(), ErrorCode::ExchangeRejected);
            assert_eq!(err.code().exit_code(), 2);
            assert!(err.to_string().contains(operation));
        }

        let err = ExecutionError::from_gateway(
            "cancel_all_orders",
            GatewayError::Rejected {
                code: -1102,
                message: "Mandatory parameter was not sent.".to_string(),
            },
        );
        assert_eq!(err.code(), ErrorCode::OrderRejected);
    }

    #[test]
    fn rate_limit_maps_to_unavailable() {
        let err = ExecutionError::from_gateway("get_symbol_rules", GatewayError::RateLimited);
        assert_eq!(err.code(), ErrorCode::GatewayUnavailable);
    }

    #[test]
    fn sizing_errors_map_to_taxonomy() {
        let err: ExecutionError = SizingError::BelowMinNotional {
            quantity: dec!(0.001),
            notional: dec!(67.39),
            min_notional: dec!(100),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::BelowMinNotional);

        let err: ExecutionError = SizingError::QuantityTooSmall {
            quantity: dec!(0),
            min_qty: dec!(0.001),
            raw_quantity: dec!(0.0007),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::QuantityTooSmall);
    }

    #[test]
    fn order_errors_are_invalid_quantity() {
        let err: ExecutionError = OrderError::InvalidQuantity {
            quantity: dec!(0.0025),
            reason: "off step".to_string(),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::InvalidQuantity);
    }

    #[test]
    fn error_code_reason_and_exit_code() {
        assert_eq!(ErrorCode::BelowMinNotional.reason(), "BELOW_MIN_NOTIONAL");
        assert_eq!(ErrorCode::SubmissionOutcomeUnknown.exit_code(), 4);
        assert_eq!(ErrorCode::UnknownSymbol.exit_code(), 2);
    }
}
