//! Roadmap projection: a read-only, chronological timeline of an issue built
//! from its audit entries and its live state.
//!
//! The projection is pure. Running it twice over the same inputs yields the
//! same events, and appending an audit entry only appends events (unless the
//! trailing current-status marker was needed before).

use serde::Serialize;

use crate::audit::{AssignmentStatusChange, AuditAction, AuditEntry, Change, Changes};
use crate::issue::{AssignmentStatus, Issue, IssueStatus, UserRef};
use crate::types::{DbId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    Created,
    Assigned,
    Unassigned,
    AssignmentPending,
    AssignmentAccepted,
    AssignmentRejected,
    AssignmentCleared,
    StatusChanged,
    CurrentStatus,
}

/// One entry of the roadmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    /// Stable id derived from the audit entry that produced the event.
    pub id: String,
    pub kind: TimelineEventKind,
    pub title: String,
    pub description: String,
    /// Issue status once this event has happened.
    pub status: IssueStatus,
    pub timestamp: Timestamp,
    pub actor: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<UserRef>,
}

/// Project `entries` over `issue` into a timeline, oldest first.
pub fn project(issue: &Issue, entries: &[AuditEntry]) -> Vec<TimelineEvent> {
    events(issue, entries).collect()
}

/// Lazy form of [`project`].
pub fn events<'a>(
    issue: &'a Issue,
    entries: &'a [AuditEntry],
) -> impl Iterator<Item = TimelineEvent> + 'a {
    let mut updates: Vec<&AuditEntry> = entries
        .iter()
        .filter(|entry| entry.action == AuditAction::Update)
        .collect();
    updates.sort_by_key(|entry| (entry.timestamp, entry.id));

    let tracked = updates
        .iter()
        .rev()
        .find_map(|entry| entry.changes.status.as_ref().map(|change| change.to))
        .unwrap_or(IssueStatus::Open);

    let mut status = IssueStatus::Open;
    let history = updates.into_iter().flat_map(move |entry| {
        let (entry_events, after) = entry_events(entry, status);
        status = after;
        entry_events
    });

    let current = (tracked != issue.status).then(|| current_status(issue));

    std::iter::once(created(issue)).chain(history).chain(current)
}

fn created(issue: &Issue) -> TimelineEvent {
    TimelineEvent {
        id: "creation".to_string(),
        kind: TimelineEventKind::Created,
        title: "Issue Created".to_string(),
        description: "Issue was reported".to_string(),
        status: IssueStatus::Open,
        timestamp: issue.created_at,
        actor: issue.reporter,
        assignee: None,
    }
}

/// Events for one `UPDATE` entry, in field order assignee, assignment status,
/// status. Returns the issue status after the entry.
fn entry_events(entry: &AuditEntry, before: IssueStatus) -> (Vec<TimelineEvent>, IssueStatus) {
    let Changes {
        assignee,
        assignment_status,
        status,
        ..
    } = &entry.changes;
    let after = status.as_ref().map_or(before, |change| change.to);

    let event = |id: String, kind, title: &str, description: String, assignee| TimelineEvent {
        id,
        kind,
        title: title.to_string(),
        description,
        status: after,
        timestamp: entry.timestamp,
        actor: entry.performed_by,
        assignee,
    };

    let mut events = Vec::new();
    if let Some(change) = assignee {
        let (kind, title, description) = assignee_text(change);
        events.push(event(
            format!("assignment-{}", entry.id),
            kind,
            title,
            description,
            change.to.clone(),
        ));
    }
    if let Some(change) = assignment_status {
        let (kind, title, description) = assignment_status_text(change);
        events.push(event(
            format!("assignment-status-{}", entry.id),
            kind,
            title,
            description,
            change.assignee.clone(),
        ));
    }
    if let Some(change) = status {
        events.push(event(
            format!("status-{}", entry.id),
            TimelineEventKind::StatusChanged,
            status_title(change.to),
            format!("Status changed from \"{}\" to \"{}\"", change.from, change.to),
            None,
        ));
    }
    (events, after)
}

fn assignee_text(change: &Change<Option<UserRef>>) -> (TimelineEventKind, &'static str, String) {
    match &change.to {
        Some(user) => (
            TimelineEventKind::Assigned,
            "Issue Assigned",
            format!("Assigned to {} ({})", user.name, user.email),
        ),
        None => (
            TimelineEventKind::Unassigned,
            "Assignment Removed",
            "Issue unassigned by admin".to_string(),
        ),
    }
}

fn assignment_status_text(
    change: &AssignmentStatusChange,
) -> (TimelineEventKind, &'static str, String) {
    let name = change
        .assignee
        .as_ref()
        .map_or("Developer", |user| user.name.as_str());
    match change.to {
        Some(AssignmentStatus::Accepted) => (
            TimelineEventKind::AssignmentAccepted,
            "Assignment Accepted",
            format!("{name} accepted the assignment"),
        ),
        Some(AssignmentStatus::Rejected) => (
            TimelineEventKind::AssignmentRejected,
            "Assignment Rejected",
            format!("{name} rejected the assignment"),
        ),
        Some(AssignmentStatus::Pending) => (
            TimelineEventKind::AssignmentPending,
            "Assignment Pending",
            "Assignment status reset to pending".to_string(),
        ),
        None => (
            TimelineEventKind::AssignmentCleared,
            "Assignment Status Changed",
            "Assignment status cleared".to_string(),
        ),
    }
}

fn status_title(status: IssueStatus) -> &'static str {
    match status {
        IssueStatus::Open => "Issue Opened",
        IssueStatus::InProgress => "Work Started",
        IssueStatus::Resolved => "Issue Resolved",
    }
}

fn current_status(issue: &Issue) -> TimelineEvent {
    let title = match issue.status {
        IssueStatus::Open => "Issue Open",
        IssueStatus::InProgress => "In Progress",
        IssueStatus::Resolved => "Issue Resolved",
    };
    TimelineEvent {
        id: "current".to_string(),
        kind: TimelineEventKind::CurrentStatus,
        title: title.to_string(),
        description: format!("Current status: {}", issue.status),
        status: issue.status,
        timestamp: issue.updated_at,
        actor: issue.reporter,
        assignee: None,
    }
}
