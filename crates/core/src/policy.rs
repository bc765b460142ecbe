//! Authorization policy for issue operations.
//!
//! All role and ownership checks live in one `(role, operation)` table,
//! [`rule_for`]. Each row resolves to a [`Rule`] that is then evaluated
//! against the target issue. Every denial carries a distinct reason.

use crate::error::CoreError;
use crate::issue::{Actor, Issue, IssuePatch};
use crate::roles::Role;

// ---------------------------------------------------------------------------
// Operations and rules
// ---------------------------------------------------------------------------

/// Operations gated by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Create,
    /// Editing `title`, `description`, or `priority`.
    EditDetails,
    ChangeStatus,
    ChangeAssignee,
    /// Accepting or rejecting a pending assignment.
    RespondToAssignment,
    Delete,
    /// Paging through the audit log of every issue.
    ListAuditLogs,
}

/// How a `(role, operation)` pair is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Allow,
    Deny(&'static str),
    /// Allowed only for the issue's reporter.
    Reporter,
    /// Allowed only for the reporter, and only while nobody is assigned.
    ReporterWhileUnassigned,
    /// Allowed only for the issue's current assignee.
    Assignee,
}

pub const DENY_READ_NOT_REPORTER: &str = "Users can only view issues they reported";
pub const DENY_EDIT_NOT_REPORTER: &str = "Only the reporter can edit this issue";
pub const DENY_EDIT_ASSIGNED: &str = "Issue details are locked once the issue is assigned";
pub const DENY_STATUS: &str = "Only Developer or Admin can update status";
pub const DENY_ASSIGN: &str = "Only Admin can assign issues";
pub const DENY_RESPOND_ROLE: &str = "Only the assigned Developer can respond to an assignment";
pub const DENY_RESPOND_NOT_ASSIGNEE: &str = "Issue not assigned to you";
pub const DENY_DELETE: &str = "Only Admin can delete issues";
pub const DENY_AUDIT_LOG: &str = "Only Admin can view the full audit log";
pub const DENY_NO_SUBJECT: &str = "Operation requires an existing issue";

/// The policy table.
pub const fn rule_for(role: Role, operation: Operation) -> Rule {
    use Operation::*;

    match (role, operation) {
        (_, Create) => Rule::Allow,

        (Role::Admin | Role::Developer, Read) => Rule::Allow,
        (Role::User, Read) => Rule::Reporter,

        (Role::Admin | Role::Developer, EditDetails) => Rule::Allow,
        (Role::User, EditDetails) => Rule::ReporterWhileUnassigned,

        (Role::Admin | Role::Developer, ChangeStatus) => Rule::Allow,
        (Role::User, ChangeStatus) => Rule::Deny(DENY_STATUS),

        (Role::Admin, ChangeAssignee) => Rule::Allow,
        (_, ChangeAssignee) => Rule::Deny(DENY_ASSIGN),

        (Role::Developer, RespondToAssignment) => Rule::Assignee,
        (_, RespondToAssignment) => Rule::Deny(DENY_RESPOND_ROLE),

        (Role::Admin, Delete) => Rule::Allow,
        (_, Delete) => Rule::Deny(DENY_DELETE),

        (Role::Admin, ListAuditLogs) => Rule::Allow,
        (_, ListAuditLogs) => Rule::Deny(DENY_AUDIT_LOG),
    }
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(&'static str),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(CoreError::NotAuthorized(reason.to_string())),
        }
    }
}

/// Decide whether `actor` may perform `operation` on `issue`.
///
/// `issue` is `None` for operations without a subject (create, audit log
/// listing); rules that need ownership data deny in that case.
pub fn authorize(actor: &Actor, operation: Operation, issue: Option<&Issue>) -> Decision {
    match rule_for(actor.role, operation) {
        Rule::Allow => Decision::Allow,
        Rule::Deny(reason) => Decision::Deny(reason),
        Rule::Reporter => match issue {
            Some(issue) if issue.reporter == actor.id => Decision::Allow,
            Some(_) if operation == Operation::Read => Decision::Deny(DENY_READ_NOT_REPORTER),
            Some(_) => Decision::Deny(DENY_EDIT_NOT_REPORTER),
            None => Decision::Deny(DENY_NO_SUBJECT),
        },
        Rule::ReporterWhileUnassigned => match issue {
            Some(issue) if issue.reporter != actor.id => Decision::Deny(DENY_EDIT_NOT_REPORTER),
            Some(issue) if issue.assignee().is_some() => Decision::Deny(DENY_EDIT_ASSIGNED),
            Some(_) => Decision::Allow,
            None => Decision::Deny(DENY_NO_SUBJECT),
        },
        Rule::Assignee => match issue {
            Some(issue) if issue.assignee() == Some(actor.id) => Decision::Allow,
            Some(_) => Decision::Deny(DENY_RESPOND_NOT_ASSIGNEE),
            None => Decision::Deny(DENY_NO_SUBJECT),
        },
    }
}

/// The operations a patch touches, one per present field group.
pub fn operations_for_patch(patch: &IssuePatch) -> Vec<Operation> {
    let mut operations = Vec::new();
    if patch.title.is_some() || patch.description.is_some() || patch.priority.is_some() {
        operations.push(Operation::EditDetails);
    }
    if patch.status.is_some() {
        operations.push(Operation::ChangeStatus);
    }
    if patch.assignee.is_some() {
        operations.push(Operation::ChangeAssignee);
    }
    operations
}

/// Check every field in `patch` against the policy; the first denial wins.
pub fn can_apply(actor: &Actor, issue: &Issue, patch: &IssuePatch) -> Decision {
    operations_for_patch(patch)
        .into_iter()
        .map(|operation| authorize(actor, operation, Some(issue)))
        .find(|decision| !decision.is_allowed())
        .unwrap_or(Decision::Allow)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{Assignment, IssuePriority, IssueStatus};

    const REPORTER: i64 = 10;
    const DEV: i64 = 20;
    const OTHER_DEV: i64 = 21;

    fn issue(assignment: Assignment) -> Issue {
        let now = chrono::Utc::now();
        Issue {
            id: 1,
            title: "Login bug".into(),
            description: "Cannot log in after reset".into(),
            status: IssueStatus::Open,
            priority: IssuePriority::Medium,
            reporter: REPORTER,
            assignment,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    fn admin() -> Actor {
        Actor::new(1, Role::Admin)
    }

    fn dev(id: i64) -> Actor {
        Actor::new(id, Role::Developer)
    }

    fn user(id: i64) -> Actor {
        Actor::new(id, Role::User)
    }

    // -- read ----------------------------------------------------------------

    #[test]
    fn users_read_only_their_own_issues() {
        let subject = issue(Assignment::Unassigned);
        assert_eq!(authorize(&user(REPORTER), Operation::Read, Some(&subject)), Decision::Allow);
        assert_eq!(
            authorize(&user(99), Operation::Read, Some(&subject)),
            Decision::Deny(DENY_READ_NOT_REPORTER)
        );
        assert!(authorize(&dev(DEV), Operation::Read, Some(&subject)).is_allowed());
        assert!(authorize(&admin(), Operation::Read, Some(&subject)).is_allowed());
    }

    #[test]
    fn everyone_may_create() {
        for actor in [admin(), dev(DEV), user(REPORTER)] {
            assert!(authorize(&actor, Operation::Create, None).is_allowed());
        }
    }

    // -- details -------------------------------------------------------------

    #[test]
    fn reporter_loses_edit_rights_once_assigned() {
        let patch = IssuePatch { priority: Some(IssuePriority::High), ..Default::default() };
        assert!(can_apply(&user(REPORTER), &issue(Assignment::Unassigned), &patch).is_allowed());
        assert_eq!(
            can_apply(&user(REPORTER), &issue(Assignment::Pending(DEV)), &patch),
            Decision::Deny(DENY_EDIT_ASSIGNED)
        );
        assert_eq!(
            can_apply(&user(99), &issue(Assignment::Unassigned), &patch),
            Decision::Deny(DENY_EDIT_NOT_REPORTER)
        );
    }

    #[test]
    fn reporter_regains_edit_rights_after_rejection() {
        let patch = IssuePatch { title: Some("Login bug v2".into()), ..Default::default() };
        assert!(can_apply(&user(REPORTER), &issue(Assignment::Rejected), &patch).is_allowed());
    }

    #[test]
    fn staff_edit_details_unconditionally() {
        let patch = IssuePatch { description: Some("Updated description".into()), ..Default::default() };
        let subject = issue(Assignment::Accepted(OTHER_DEV));
        assert!(can_apply(&dev(DEV), &subject, &patch).is_allowed());
        assert!(can_apply(&admin(), &subject, &patch).is_allowed());
    }

    // -- status --------------------------------------------------------------

    #[test]
    fn users_never_change_status() {
        let patch = IssuePatch { status: Some(IssueStatus::Resolved), ..Default::default() };
        assert_eq!(
            can_apply(&user(REPORTER), &issue(Assignment::Unassigned), &patch),
            Decision::Deny(DENY_STATUS)
        );
        assert!(can_apply(&dev(DEV), &issue(Assignment::Unassigned), &patch).is_allowed());
    }

    // -- assignment ----------------------------------------------------------

    #[test]
    fn only_admin_assigns_even_self_assignment() {
        let patch = IssuePatch { assignee: Some(Some(DEV)), ..Default::default() };
        let subject = issue(Assignment::Unassigned);
        assert_eq!(can_apply(&dev(DEV), &subject, &patch), Decision::Deny(DENY_ASSIGN));
        assert_eq!(can_apply(&user(REPORTER), &subject, &patch), Decision::Deny(DENY_ASSIGN));
        assert!(can_apply(&admin(), &subject, &patch).is_allowed());

        let unassign = IssuePatch { assignee: Some(None), ..Default::default() };
        assert_eq!(can_apply(&dev(DEV), &subject, &unassign), Decision::Deny(DENY_ASSIGN));
    }

    #[test]
    fn only_current_assignee_developer_responds() {
        let subject = issue(Assignment::Pending(DEV));
        assert!(authorize(&dev(DEV), Operation::RespondToAssignment, Some(&subject)).is_allowed());
        assert_eq!(
            authorize(&dev(OTHER_DEV), Operation::RespondToAssignment, Some(&subject)),
            Decision::Deny(DENY_RESPOND_NOT_ASSIGNEE)
        );
        assert_eq!(
            authorize(&admin(), Operation::RespondToAssignment, Some(&subject)),
            Decision::Deny(DENY_RESPOND_ROLE)
        );
    }

    // -- delete / audit ------------------------------------------------------

    #[test]
    fn only_admin_deletes_and_lists_audit_logs() {
        let subject = issue(Assignment::Unassigned);
        assert!(authorize(&admin(), Operation::Delete, Some(&subject)).is_allowed());
        assert_eq!(
            authorize(&user(REPORTER), Operation::Delete, Some(&subject)),
            Decision::Deny(DENY_DELETE)
        );
        assert!(authorize(&admin(), Operation::ListAuditLogs, None).is_allowed());
        assert!(!authorize(&dev(DEV), Operation::ListAuditLogs, None).is_allowed());
    }

    // -- combined patches ----------------------------------------------------

    #[test]
    fn a_single_denied_field_denies_the_whole_patch() {
        let patch = IssuePatch {
            title: Some("Allowed title".into()),
            status: Some(IssueStatus::InProgress),
            ..Default::default()
        };
        assert_eq!(
            can_apply(&user(REPORTER), &issue(Assignment::Unassigned), &patch),
            Decision::Deny(DENY_STATUS)
        );
    }

    #[test]
    fn empty_patch_is_allowed() {
        assert!(can_apply(&user(99), &issue(Assignment::Unassigned), &IssuePatch::default()).is_allowed());
    }

    #[test]
    fn denial_maps_to_not_authorized_with_reason() {
        let err = Decision::Deny(DENY_ASSIGN).into_result().unwrap_err();
        assert!(matches!(err, CoreError::NotAuthorized(ref reason) if reason == DENY_ASSIGN));
    }
}
