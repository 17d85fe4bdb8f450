//! Domain errors for the futures executor.

use std::fmt;

/// Domain-level errors that can occur in business logic.
///
/// These errors are independent of infrastructure concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid state transition attempted.
    InvalidStateTransition {
        /// Entity type (e.g., "Workflow").
        entity: String,
        /// Current state.
        from: String,
        /// Attempted state.
        to: String,
        /// Reason for failure.
        reason: String,
    },

    /// Invalid value for a field.
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },

    /// Exchange rule snapshot violates its own invariants.
    InvalidRules {
        /// Symbol the rules belong to.
        symbol: String,
        /// Description of the violation.
        message: String,
    },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStateTransition {
                entity,
                from,
                to,
                reason,
            } => {
                write!(
                    f,
                    "Invalid state transition for {entity}: {from} -> {to}: {reason}"
                )
            }
            Self::InvalidValue { field, message } => {
                write!(f, "Invalid value for '{field}': {message}")
            }
            Self::InvalidRules { symbol, message } => {
                write!(f, "Invalid trading rules for {symbol}: {message}")
            }
        }
    }
}

impl std::error::Error for DomainError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_state_transition_display() {
        let err = DomainError::InvalidStateTransition {
            entity: "Workflow".to_string(),
            from: "INIT".to_string(),
            to: "SUBMITTED".to_string(),
            reason: "steps cannot be skipped".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition for Workflow: INIT -> SUBMITTED: steps cannot be skipped"
        );
    }

    #[test]
    fn invalid_value_display() {
        let err = DomainError::InvalidValue {
            field: "leverage".to_string(),
            message: "must be at least 1".to_string(),
        };
        assert!(err.to_string().contains("'leverage'"));
    }

    #[test]
    fn invalid_rules_display() {
        let err = DomainError::InvalidRules {
            symbol: "BTCUSDT".to_string(),
            message: "step size must be positive".to_string(),
        };
        assert!(err.to_string().starts_with("Invalid trading rules for BTCUSDT"));
    }
}
