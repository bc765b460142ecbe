//! Assignment lifecycle.
//!
//! ```text
//! Unassigned --assign--> Pending --accept--> Accepted
//!     ^                    |  \
//!     |                    |   `--reject--> Rejected (assignee cleared)
//!     `------unassign------'
//! ```
//!
//! `assign` is refused while an offer is `Pending`; `unassign` is always
//! allowed and also clears a `Rejected` status. Every change yields the diff fragments recorded in the audit
//! entry, including denormalized snapshots of the developers involved.

use crate::audit::{AssignmentStatusChange, Change, Changes};
use crate::error::CoreError;
use crate::issue::{Assignment, AssignmentStatus, UserRef};
use crate::policy::DENY_RESPOND_NOT_ASSIGNEE;
use crate::types::DbId;

pub const PENDING_CONFLICT: &str = "cannot change assignment while a pending assignment exists; \
     wait for accept/reject or unassign first";

/// Result of an assignment transition: the new state plus its audit diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub assignment: Assignment,
    pub assignee_change: Option<Change<Option<UserRef>>>,
    pub status_change: Option<AssignmentStatusChange>,
}

impl AssignmentOutcome {
    pub fn unchanged(assignment: Assignment) -> Self {
        Self {
            assignment,
            assignee_change: None,
            status_change: None,
        }
    }

    pub fn is_unchanged(&self) -> bool {
        self.assignee_change.is_none() && self.status_change.is_none()
    }

    /// Merge this outcome's diff into `changes`.
    pub fn record_into(&self, changes: &mut Changes) {
        if let Some(change) = &self.assignee_change {
            changes.assignee = Some(change.clone());
        }
        if let Some(change) = &self.status_change {
            changes.assignment_status = Some(change.clone());
        }
    }
}

/// Offer the issue to `target`.
///
/// `previous` is the snapshot of the current assignee, if any. Offering the
/// issue to its current assignee changes nothing.
pub fn assign(
    current: Assignment,
    previous: Option<&UserRef>,
    target: &UserRef,
) -> Result<AssignmentOutcome, CoreError> {
    if current.assignee() == Some(target.id) {
        return Ok(AssignmentOutcome::unchanged(current));
    }
    if let Assignment::Pending(_) = current {
        return Err(CoreError::AssignmentConflict(PENDING_CONFLICT.to_string()));
    }

    let next = Assignment::Pending(target.id);
    Ok(AssignmentOutcome {
        assignment: next,
        assignee_change: Some(Change::new(previous.cloned(), Some(target.clone()))),
        status_change: Some(AssignmentStatusChange {
            from: current.status(),
            to: next.status(),
            assignee: Some(target.clone()),
        }),
    })
}

/// Clear the assignee and the assignment status.
///
/// From `Rejected` only the status is cleared; from `Unassigned` nothing
/// changes.
pub fn unassign(current: Assignment, previous: Option<&UserRef>) -> AssignmentOutcome {
    match current {
        Assignment::Unassigned => return AssignmentOutcome::unchanged(current),
        Assignment::Rejected => {
            return AssignmentOutcome {
                assignment: Assignment::Unassigned,
                assignee_change: None,
                status_change: Some(AssignmentStatusChange {
                    from: Some(AssignmentStatus::Rejected),
                    to: None,
                    assignee: None,
                }),
            }
        }
        Assignment::Pending(_) | Assignment::Accepted(_) => {}
    }

    AssignmentOutcome {
        assignment: Assignment::Unassigned,
        assignee_change: Some(Change::new(previous.cloned(), None)),
        status_change: Some(AssignmentStatusChange {
            from: current.status(),
            to: None,
            assignee: previous.cloned(),
        }),
    }
}

/// The assignee accepts a pending offer.
pub fn accept(
    current: Assignment,
    actor_id: DbId,
    responder: &UserRef,
) -> Result<AssignmentOutcome, CoreError> {
    let assignee = pending_assignee(current, actor_id)?;

    Ok(AssignmentOutcome {
        assignment: Assignment::Accepted(assignee),
        assignee_change: None,
        status_change: Some(AssignmentStatusChange {
            from: Some(AssignmentStatus::Pending),
            to: Some(AssignmentStatus::Accepted),
            assignee: Some(responder.clone()),
        }),
    })
}

/// The assignee rejects a pending offer; the issue returns to the pool.
pub fn reject(
    current: Assignment,
    actor_id: DbId,
    responder: &UserRef,
) -> Result<AssignmentOutcome, CoreError> {
    pending_assignee(current, actor_id)?;

    Ok(AssignmentOutcome {
        assignment: Assignment::Rejected,
        assignee_change: Some(Change::new(Some(responder.clone()), None)),
        status_change: Some(AssignmentStatusChange {
            from: Some(AssignmentStatus::Pending),
            to: Some(AssignmentStatus::Rejected),
            assignee: Some(responder.clone()),
        }),
    })
}

/// The actor must be the assignee (`NotAuthorized`) and the offer must still
/// be pending (`InvalidState`).
fn pending_assignee(current: Assignment, actor_id: DbId) -> Result<DbId, CoreError> {
    if current.assignee() != Some(actor_id) {
        return Err(CoreError::NotAuthorized(DENY_RESPOND_NOT_ASSIGNEE.to_string()));
    }
    match current {
        Assignment::Pending(id) => Ok(id),
        other => Err(CoreError::InvalidState(format!(
            "assignment is not pending (current: {})",
            other.status().map_or("none", |s| s.as_str())
        ))),
    }
}
