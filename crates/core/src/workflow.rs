//! The issue workflow service.
//!
//! Each operation loads at most one issue, runs every policy and state
//! machine check against it, and only then performs a single store call that
//! writes the issue together with its audit entry.

use std::sync::Arc;

use chrono::Utc;

use crate::assignment::{self, AssignmentOutcome};
use crate::audit::{AuditEntry, AuditPage, Change, Changes, NewAuditEntry, PageRequest};
use crate::dashboard::{self, DashboardScope, IssueStats, ReporterCount};
use crate::error::CoreError;
use crate::issue::{
    validate_input, Actor, CreateIssue, Issue, IssueFilter, IssuePatch, NewIssue, UserRef,
};
use crate::policy::{self, Operation};
use crate::roadmap::{self, TimelineEvent};
use crate::roles::Role;
use crate::status::{self, StatusTransition};
use crate::store::{IssueStore, UserDirectory};
use crate::types::DbId;

pub const ASSIGNEE_NOT_DEVELOPER: &str = "Issues can only be assigned to developers";

#[derive(Clone)]
pub struct IssueWorkflowService {
    store: Arc<dyn IssueStore>,
    users: Arc<dyn UserDirectory>,
}

impl IssueWorkflowService {
    pub fn new(store: Arc<dyn IssueStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { store, users }
    }

    /// Store reachability, for health checks.
    pub async fn ping(&self) -> Result<(), CoreError> {
        Ok(self.store.ping().await?)
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    /// Create an issue reported by `actor`, at `Open` with a `CREATE` entry.
    pub async fn create_issue(&self, actor: &Actor, input: CreateIssue) -> Result<Issue, CoreError> {
        policy::authorize(actor, Operation::Create, None).into_result()?;
        validate_input(&input)?;

        let new = NewIssue {
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            reporter: actor.id,
        };
        Ok(self.store.insert_issue(&new, actor.id).await?)
    }

    /// Issues matching `filter`. `User` actors only ever see their own reports.
    pub async fn list_issues(
        &self,
        actor: &Actor,
        mut filter: IssueFilter,
    ) -> Result<Vec<Issue>, CoreError> {
        filter.reporter = match actor.role {
            Role::User => Some(actor.id),
            Role::Admin | Role::Developer => None,
        };
        Ok(self.store.list_issues(&filter).await?)
    }

    pub async fn get_issue(&self, actor: &Actor, id: DbId) -> Result<Issue, CoreError> {
        let issue = self.load(id).await?;
        policy::authorize(actor, Operation::Read, Some(&issue)).into_result()?;
        Ok(issue)
    }

    /// Apply `patch` to an issue.
    ///
    /// Every present field is authorized and validated before anything is
    /// written. Fields equal to their stored value are ignored; if nothing
    /// differs the issue is returned as-is and no audit entry is written.
    pub async fn update_issue(
        &self,
        actor: &Actor,
        id: DbId,
        patch: IssuePatch,
    ) -> Result<Issue, CoreError> {
        validate_input(&patch)?;
        let current = self.load(id).await?;
        policy::can_apply(actor, &current, &patch).into_result()?;

        let mut next = current.clone();
        let mut changes = Changes::default();

        if let Some(title) = patch.title.filter(|title| *title != current.title) {
            changes.title = Some(Change::new(current.title.clone(), title.clone()));
            next.title = title;
        }
        if let Some(description) = patch.description.filter(|d| *d != current.description) {
            changes.description = Some(Change::new(current.description.clone(), description.clone()));
            next.description = description;
        }
        if let Some(priority) = patch.priority.filter(|p| *p != current.priority) {
            changes.priority = Some(Change::new(current.priority, priority));
            next.priority = priority;
        }
        if let Some(requested) = patch.status {
            if let StatusTransition::Changed { from, to } = status::transition(current.status, requested)? {
                changes.status = Some(Change::new(from, to));
                next.status = to;
            }
        }
        if let Some(requested) = patch.assignee {
            let outcome = self.reassign(&current, requested).await?;
            outcome.record_into(&mut changes);
            next.assignment = outcome.assignment;
        }

        if changes.is_empty() {
            return Ok(current);
        }
        Ok(self
            .store
            .update_issue(&next, &NewAuditEntry::update(actor.id, changes))
            .await?)
    }

    /// The assignee takes on a pending assignment.
    pub async fn accept_assignment(&self, actor: &Actor, id: DbId) -> Result<Issue, CoreError> {
        let current = self.load(id).await?;
        policy::authorize(actor, Operation::RespondToAssignment, Some(&current)).into_result()?;

        let responder = self.snapshot(actor.id).await?;
        let outcome = assignment::accept(current.assignment, actor.id, &responder)?;
        self.commit_assignment(actor, current, outcome).await
    }

    /// The assignee declines a pending assignment, returning the issue to the
    /// unassigned pool.
    pub async fn reject_assignment(&self, actor: &Actor, id: DbId) -> Result<Issue, CoreError> {
        let current = self.load(id).await?;
        policy::authorize(actor, Operation::RespondToAssignment, Some(&current)).into_result()?;

        let responder = self.snapshot(actor.id).await?;
        let outcome = assignment::reject(current.assignment, actor.id, &responder)?;
        self.commit_assignment(actor, current, outcome).await
    }

    /// Remove an issue. Its audit trail, including the `DELETE` entry, stays.
    pub async fn delete_issue(&self, actor: &Actor, id: DbId) -> Result<(), CoreError> {
        let current = self.load(id).await?;
        policy::authorize(actor, Operation::Delete, Some(&current)).into_result()?;

        self.store
            .delete_issue(current.id, current.version, &NewAuditEntry::delete(actor.id))
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // History
    // -----------------------------------------------------------------------

    pub async fn list_audit_logs(
        &self,
        actor: &Actor,
        page: PageRequest,
    ) -> Result<AuditPage, CoreError> {
        policy::authorize(actor, Operation::ListAuditLogs, None).into_result()?;
        Ok(self.store.list_audit_entries(page).await?)
    }

    /// One issue's audit trail, newest first.
    ///
    /// Anyone who may read the issue may read its history. The history of a
    /// deleted issue falls under the global audit log permission.
    pub async fn audit_logs_for_issue(
        &self,
        actor: &Actor,
        issue_id: DbId,
    ) -> Result<Vec<AuditEntry>, CoreError> {
        let decision = match self.store.find_issue(issue_id).await? {
            Some(issue) => policy::authorize(actor, Operation::Read, Some(&issue)),
            None => policy::authorize(actor, Operation::ListAuditLogs, None),
        };
        decision.into_result()?;
        Ok(self.store.audit_entries_for_issue(issue_id).await?)
    }

    /// The issue's timeline, oldest first.
    pub async fn roadmap(&self, actor: &Actor, id: DbId) -> Result<Vec<TimelineEvent>, CoreError> {
        let issue = self.get_issue(actor, id).await?;
        let entries = self.store.audit_entries_for_issue(id).await?;
        Ok(roadmap::project(&issue, &entries))
    }

    pub async fn dashboard(&self, actor: &Actor) -> Result<IssueStats, CoreError> {
        let scope = DashboardScope::for_actor(actor);
        let issues = self.store.list_issues(&scope.filter(actor)).await?;
        let now = Utc::now();
        let mut stats = dashboard::summarize(scope, &issues);

        match scope {
            DashboardScope::All => {
                let activity = self
                    .store
                    .list_audit_entries(PageRequest::new(
                        Some(1),
                        Some(dashboard::RECENT_ACTIVITY_LIMIT),
                    ))
                    .await?;
                let mut top_reporters = Vec::new();
                for (reporter, count) in dashboard::top_reporters(&issues) {
                    top_reporters.push(ReporterCount {
                        reporter: self.snapshot(reporter).await?,
                        count,
                    });
                }
                stats.recent_activity = Some(activity.items);
                stats.issues_over_time = Some(dashboard::issues_over_time(&issues, now));
                stats.top_reporters = Some(top_reporters);
            }
            DashboardScope::AssignedToMe => {
                let pool = IssueFilter {
                    unassigned: Some(true),
                    ..Default::default()
                };
                let unassigned = self.store.list_issues(&pool).await?;
                stats.available_unassigned = Some(unassigned.len() as i64);
                stats.available_issues = Some(dashboard::available_issues(&unassigned));
                stats.resolved_this_month = Some(dashboard::resolved_this_month(&issues, now));
                stats.recent_issues = Some(dashboard::recent_issues(&issues));
            }
            DashboardScope::ReportedByMe => {
                stats.recent_issues = Some(dashboard::recent_issues(&issues));
            }
        }
        Ok(stats)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    async fn load(&self, id: DbId) -> Result<Issue, CoreError> {
        self.store
            .find_issue(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "issue", id })
    }

    /// Snapshot of a user for the audit trail. A user missing from the
    /// directory is recorded by id alone.
    async fn snapshot(&self, id: DbId) -> Result<UserRef, CoreError> {
        Ok(match self.users.find_user(id).await? {
            Some(user) => UserRef::from(&user),
            None => UserRef {
                id,
                name: format!("User #{id}"),
                email: String::new(),
            },
        })
    }

    /// Resolve an assignment target; it must exist and be a developer.
    async fn assignable(&self, id: DbId) -> Result<UserRef, CoreError> {
        let user = self
            .users
            .find_user(id)
            .await?
            .ok_or(CoreError::NotFound { entity: "user", id })?;
        if user.role != Role::Developer {
            return Err(CoreError::Validation(ASSIGNEE_NOT_DEVELOPER.to_string()));
        }
        Ok(UserRef::from(&user))
    }

    /// Route a requested assignee through the assignment state machine.
    async fn reassign(
        &self,
        current: &Issue,
        requested: Option<DbId>,
    ) -> Result<AssignmentOutcome, CoreError> {
        if requested.is_some() && requested == current.assignee() {
            return Ok(AssignmentOutcome::unchanged(current.assignment));
        }

        let previous = match current.assignee() {
            Some(id) => Some(self.snapshot(id).await?),
            None => None,
        };
        match requested {
            Some(target) => {
                let target = self.assignable(target).await?;
                assignment::assign(current.assignment, previous.as_ref(), &target)
            }
            None => Ok(assignment::unassign(current.assignment, previous.as_ref())),
        }
    }

    async fn commit_assignment(
        &self,
        actor: &Actor,
        current: Issue,
        outcome: AssignmentOutcome,
    ) -> Result<Issue, CoreError> {
        let mut changes = Changes::default();
        outcome.record_into(&mut changes);

        let mut next = current;
        next.assignment = outcome.assignment;
        Ok(self
            .store
            .update_issue(&next, &NewAuditEntry::update(actor.id, changes))
            .await?)
    }
}
