//! Workflow states for one position-opening attempt.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage reached by an order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowState {
    /// Nothing has happened yet.
    Init,
    /// Symbol rules fetched and validated.
    RulesLoaded,
    /// Exchange confirmed the leverage.
    LeverageSet,
    /// Order quantity derived from the notional amount.
    QuantityComputed,
    /// Exchange accepted the order.
    Submitted,
    /// Post-trade positions read back.
    Reconciled,
    /// A step failed; the attempt is over.
    Failed,
}

impl WorkflowState {
    /// The happy-path order of states.
    pub const SEQUENCE: [Self; 6] = [
        Self::Init,
        Self::RulesLoaded,
        Self::LeverageSet,
        Self::QuantityComputed,
        Self::Submitted,
        Self::Reconciled,
    ];

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Reconciled | Self::Failed)
    }

    /// Returns true once an order may exist on the exchange.
    #[must_use]
    pub const fn order_may_exist(&self) -> bool {
        matches!(self, Self::Submitted | Self::Reconciled)
    }

    /// The next state on the happy path, if any.
    #[must_use]
    pub const fn successor(&self) -> Option<Self> {
        match self {
            Self::Init => Some(Self::RulesLoaded),
            Self::RulesLoaded => Some(Self::LeverageSet),
            Self::LeverageSet => Some(Self::QuantityComputed),
            Self::QuantityComputed => Some(Self::Submitted),
            Self::Submitted => Some(Self::Reconciled),
            Self::Reconciled | Self::Failed => None,
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "INIT"),
            Self::RulesLoaded => write!(f, "RULES_LOADED"),
            Self::LeverageSet => write!(f, "LEVERAGE_SET"),
            Self::QuantityComputed => write!(f, "QUANTITY_COMPUTED"),
            Self::Submitted => write!(f, "SUBMITTED"),
            Self::Reconciled => write!(f, "RECONCILED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}
