//! Workflow State Machine Service
//!
//! Validates transitions between workflow stages.

use super::state::WorkflowState;
use crate::domain::shared::DomainError;

/// State machine for the position-opening workflow.
///
/// Stages run strictly in sequence; any non-terminal stage may fail.
pub struct WorkflowStateMachine;

impl WorkflowStateMachine {
    /// Check if a state transition is valid.
    #[must_use]
    pub fn is_valid_transition(from: WorkflowState, to: WorkflowState) -> bool {
        matches!(
            (from, to),
            (WorkflowState::Init, WorkflowState::RulesLoaded)
                | (WorkflowState::RulesLoaded, WorkflowState::LeverageSet)
                | (WorkflowState::LeverageSet, WorkflowState::QuantityComputed)
                | (WorkflowState::QuantityComputed, WorkflowState::Submitted)
                | (WorkflowState::Submitted, WorkflowState::Reconciled)
                // Any live stage can fail
                | (
                    WorkflowState::Init
                        | WorkflowState::RulesLoaded
                        | WorkflowState::LeverageSet
                        | WorkflowState::QuantityComputed
                        | WorkflowState::Submitted,
                    WorkflowState::Failed
                )
        )
    }

    /// Validate a state transition.
    ///
    /// # Errors
    ///
    /// Returns error if the transition is invalid.
    pub fn validate_transition(from: WorkflowState, to: WorkflowState) -> Result<(), DomainError> {
        if Self::is_valid_transition(from, to) {
            Ok(())
        } else {
            Err(DomainError::InvalidStateTransition {
                entity: "Workflow".to_string(),
                from: from.to_string(),
                to: to.to_string(),
                reason: Self::transition_error_reason(from, to),
            })
        }
    }

    /// Get a human-readable reason for an invalid transition.
    #[must_use]
    pub fn transition_error_reason(from: WorkflowState, to: WorkflowState) -> String {
        match from {
            WorkflowState::Reconciled => {
                format!("Workflow already completed, cannot transition to {to}")
            }
            WorkflowState::Failed => format!("Workflow has failed, cannot transition to {to}"),
            _ => match from.successor() {
                Some(next) => format!("Expected {next} after {from}, got {to}"),
                None => format!("Invalid transition from {from} to {to}"),
            },
        }
    }

    /// Get all valid next states from a given state.
    #[must_use]
    pub fn valid_next_states(from: WorkflowState) -> Vec<WorkflowState> {
        match from.successor() {
            Some(next) => vec![next, WorkflowState::Failed],
            None => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_valid() {
        for pair in WorkflowState::SEQUENCE.windows(2) {
            assert!(WorkflowStateMachine::is_valid_transition(pair[0], pair[1]));
        }
    }

    #[test]
    fn steps_cannot_be_skipped() {
        assert!(!WorkflowStateMachine::is_valid_transition(
            WorkflowState::Init,
            WorkflowState::LeverageSet
        ));
        assert!(!WorkflowStateMachine::is_valid_transition(
            WorkflowState::RulesLoaded,
            WorkflowState::Submitted
        ));
    }

    #[test]
    fn steps_cannot_go_backwards() {
        assert!(!WorkflowStateMachine::is_valid_transition(
            WorkflowState::Submitted,
            WorkflowState::QuantityComputed
        ));
    }

    #[test]
    fn every_live_state_can_fail() {
        for state in &WorkflowState::SEQUENCE[..5] {
            assert!(WorkflowStateMachine::is_valid_transition(
                *state,
                WorkflowState::Failed
            ));
        }
    }

    #[test]
    fn no_transitions_from_terminal_states() {
        for terminal in [WorkflowState::Reconciled, WorkflowState::Failed] {
            assert!(WorkflowStateMachine::valid_next_states(terminal).is_empty());
            assert!(!WorkflowStateMachine::is_valid_transition(
                terminal,
                WorkflowState::Failed
            ));
        }
    }

    #[test]
    fn validate_transition_explains_skip() {
        let err = WorkflowStateMachine::validate_transition(
            WorkflowState::Init,
            WorkflowState::Submitted,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Expected RULES_LOADED after INIT"));
    }
}
