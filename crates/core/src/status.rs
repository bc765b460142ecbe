//! Issue status lifecycle.
//!
//! Legal transitions:
//! - `Open`        -> `In-Progress`
//! - `In-Progress` -> `Resolved`
//! - `Resolved`    -> `In-Progress` (reopen / correction)
//!
//! Requesting the current status is a no-op, not an error.

use crate::error::CoreError;
use crate::issue::IssueStatus;

/// Outcome of a requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    Unchanged,
    Changed { from: IssueStatus, to: IssueStatus },
}

/// Returns the set of statuses that `from` may transition to.
pub fn valid_transitions(from: IssueStatus) -> &'static [IssueStatus] {
    match from {
        IssueStatus::Open => &[IssueStatus::InProgress],
        IssueStatus::InProgress => &[IssueStatus::Resolved],
        IssueStatus::Resolved => &[IssueStatus::InProgress],
    }
}

/// Validate a requested status change from `current` to `requested`.
pub fn transition(
    current: IssueStatus,
    requested: IssueStatus,
) -> Result<StatusTransition, CoreError> {
    if current == requested {
        return Ok(StatusTransition::Unchanged);
    }
    if valid_transitions(current).contains(&requested) {
        Ok(StatusTransition::Changed {
            from: current,
            to: requested,
        })
    } else {
        Err(CoreError::InvalidTransition {
            from: current,
            to: requested,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use IssueStatus::*;

    #[test]
    fn forward_and_reopen_edges_are_legal() {
        for (from, to) in [(Open, InProgress), (InProgress, Resolved), (Resolved, InProgress)] {
            assert_eq!(transition(from, to).unwrap(), StatusTransition::Changed { from, to });
        }
    }

    #[test]
    fn same_status_is_a_no_op() {
        for status in IssueStatus::ALL {
            assert_eq!(transition(status, status).unwrap(), StatusTransition::Unchanged);
        }
    }

    #[test]
    fn skipping_and_reverting_to_open_are_rejected() {
        assert_matches!(
            transition(Open, Resolved),
            Err(CoreError::InvalidTransition { from: Open, to: Resolved })
        );
        assert_matches!(transition(Resolved, Open), Err(CoreError::InvalidTransition { .. }));
        assert_matches!(transition(InProgress, Open), Err(CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let err = transition(Open, Resolved).unwrap_err();
        assert_eq!(err.to_string(), "Invalid status transition from Open to Resolved");
    }
}
