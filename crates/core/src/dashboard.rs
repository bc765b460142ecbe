//! Role-scoped dashboard statistics over a set of issues.
//!
//! [`summarize`] covers the counters every role sees. The per-role sections
//! (recent activity and reporter rankings for admins, the pickup queue for
//! developers, recent reports for users) are built from the helpers below and
//! attached by the workflow service.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::audit::AuditEntry;
use crate::issue::{Actor, Issue, IssueFilter, IssuePriority, IssueStatus, UserRef};
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

const SECONDS_PER_DAY: f64 = 86_400.0;

pub const RECENT_ACTIVITY_LIMIT: i64 = 10;
pub const RECENT_ISSUES_LIMIT: usize = 5;
pub const AVAILABLE_ISSUES_LIMIT: usize = 10;
pub const TOP_REPORTERS_LIMIT: usize = 5;
/// Length of the issues-over-time window, in days.
pub const ACTIVITY_WINDOW_DAYS: i64 = 7;

/// Which issues a dashboard covers for a given actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardScope {
    /// Every issue (Admin).
    All,
    /// Issues currently assigned to the actor (Developer).
    AssignedToMe,
    /// Issues the actor reported (User).
    ReportedByMe,
}

impl DashboardScope {
    pub fn for_actor(actor: &Actor) -> Self {
        match actor.role {
            Role::Admin => DashboardScope::All,
            Role::Developer => DashboardScope::AssignedToMe,
            Role::User => DashboardScope::ReportedByMe,
        }
    }

    /// The listing filter selecting this scope's issues.
    pub fn filter(&self, actor: &Actor) -> IssueFilter {
        match self {
            DashboardScope::All => IssueFilter::default(),
            DashboardScope::AssignedToMe => IssueFilter {
                assignee: Some(actor.id),
                ..Default::default()
            },
            DashboardScope::ReportedByMe => IssueFilter {
                reporter: Some(actor.id),
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueStats {
    pub scope: DashboardScope,
    pub total: i64,
    pub by_status: BTreeMap<IssueStatus, i64>,
    pub by_priority: BTreeMap<IssuePriority, i64>,
    pub unassigned: i64,
    /// Critical issues that are not resolved yet.
    pub critical_unresolved: i64,
    /// Mean of `updated_at - created_at` over resolved issues, in days.
    pub avg_resolution_days: Option<f64>,
    /// Unassigned issues open to pick up; only reported to developers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_unassigned: Option<i64>,
    /// Newest audit entries across all issues (Admin).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_activity: Option<Vec<AuditEntry>>,
    /// Issues created per day over the activity window (Admin).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issues_over_time: Option<Vec<DailyCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_reporters: Option<Vec<ReporterCount>>,
    /// Issues in scope resolved during the current calendar month (Developer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_this_month: Option<i64>,
    /// Newest issues in scope (Developer and User).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_issues: Option<Vec<Issue>>,
    /// Unassigned issues, most urgent first (Developer).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_issues: Option<Vec<Issue>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReporterCount {
    pub reporter: UserRef,
    pub count: i64,
}

/// Summarize `issues`. Every status and priority is present in the maps,
/// with zero counts where nothing matches.
pub fn summarize(scope: DashboardScope, issues: &[Issue]) -> IssueStats {
    let mut by_status: BTreeMap<IssueStatus, i64> =
        IssueStatus::ALL.into_iter().map(|status| (status, 0)).collect();
    let mut by_priority: BTreeMap<IssuePriority, i64> =
        IssuePriority::ALL.into_iter().map(|priority| (priority, 0)).collect();
    let mut unassigned = 0;
    let mut critical_unresolved = 0;
    let mut resolution_seconds = Vec::new();

    for issue in issues {
        *by_status.entry(issue.status).or_default() += 1;
        *by_priority.entry(issue.priority).or_default() += 1;
        if issue.assignee().is_none() {
            unassigned += 1;
        }
        if issue.priority == IssuePriority::Critical && issue.status != IssueStatus::Resolved {
            critical_unresolved += 1;
        }
        if issue.status == IssueStatus::Resolved {
            resolution_seconds.push((issue.updated_at - issue.created_at).num_seconds() as f64);
        }
    }

    let avg_resolution_days = (!resolution_seconds.is_empty()).then(|| {
        resolution_seconds.iter().sum::<f64>() / resolution_seconds.len() as f64 / SECONDS_PER_DAY
    });

    IssueStats {
        scope,
        total: issues.len() as i64,
        by_status,
        by_priority,
        unassigned,
        critical_unresolved,
        avg_resolution_days,
        available_unassigned: None,
        recent_activity: None,
        issues_over_time: None,
        top_reporters: None,
        resolved_this_month: None,
        recent_issues: None,
        available_issues: None,
    }
}

/// Per-day creation counts for issues created within the window ending at
/// `now`, oldest day first. Days without issues are omitted.
pub fn issues_over_time(issues: &[Issue], now: Timestamp) -> Vec<DailyCount> {
    let since = now - Duration::days(ACTIVITY_WINDOW_DAYS);
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for issue in issues.iter().filter(|issue| issue.created_at >= since) {
        *per_day.entry(issue.created_at.date_naive()).or_default() += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

/// Reporters with the most issues, as `(reporter id, count)`. Ties go to the
/// lower id.
pub fn top_reporters(issues: &[Issue]) -> Vec<(DbId, i64)> {
    let mut counts: HashMap<DbId, i64> = HashMap::new();
    for issue in issues {
        *counts.entry(issue.reporter).or_default() += 1;
    }
    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by_key(|&(reporter, count)| (Reverse(count), reporter));
    ranked.truncate(TOP_REPORTERS_LIMIT);
    ranked
}

/// Resolved issues whose last update falls in the same UTC month as `now`.
pub fn resolved_this_month(issues: &[Issue], now: Timestamp) -> i64 {
    issues
        .iter()
        .filter(|issue| {
            issue.status == IssueStatus::Resolved
                && issue.updated_at.year() == now.year()
                && issue.updated_at.month() == now.month()
        })
        .count() as i64
}

/// The newest issues by creation time.
pub fn recent_issues(issues: &[Issue]) -> Vec<Issue> {
    let mut recent = issues.to_vec();
    recent.sort_by_key(|issue| Reverse((issue.created_at, issue.id)));
    recent.truncate(RECENT_ISSUES_LIMIT);
    recent
}

/// Unassigned issues ordered by priority, then newest first.
pub fn available_issues(issues: &[Issue]) -> Vec<Issue> {
    let mut available: Vec<Issue> = issues
        .iter()
        .filter(|issue| issue.assignee().is_none())
        .cloned()
        .collect();
    available.sort_by_key(|issue| Reverse((issue.priority, issue.created_at, issue.id)));
    available.truncate(AVAILABLE_ISSUES_LIMIT);
    available
}
