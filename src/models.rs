use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TrackerError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    /// "First Last", falling back to the username when both names are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub created_by: User,
    #[serde(default)]
    pub issues_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    Open,
    InProgress,
    Closed,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 3] = [IssueStatus::Open, IssueStatus::InProgress, IssueStatus::Closed];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueStatus::Open => "open",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Closed => "closed",
        }
    }

    /// Human-facing label, as shown in activity descriptions.
    pub fn label(self) -> &'static str {
        match self {
            IssueStatus::Open => "Open",
            IssueStatus::InProgress => "In Progress",
            IssueStatus::Closed => "Closed",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IssueStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                TrackerError::Validation(format!(
                    "Invalid status '{}'. Must be one of: open, in_progress, closed",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Priority::Low, Priority::Medium, Priority::High, Priority::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = TrackerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|priority| priority.as_str() == s)
            .ok_or_else(|| {
                TrackerError::Validation(format!(
                    "Invalid priority '{}'. Must be one of: low, medium, high, critical",
                    s
                ))
            })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: IssueStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub project: i64,
    pub project_name: String,
    pub reporter: User,
    pub assignee: Option<User>,
    #[serde(default)]
    pub comments_count: u32,
}

/// An issue together with its comments, as returned by `Tracker::get_issue`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: Issue,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    // Entries written before the foreign key existed load as 0 and never match an issue.
    #[serde(default)]
    pub issue_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author: User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    StatusChanged,
    Assigned,
    Commented,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub action: ActivityAction,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub user: User,
    pub issue: i64,
    pub project: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSession {
    pub user: User,
    pub tokens: AuthTokens,
}

/// The `{ "results": [...] }` envelope every list operation returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing<T> {
    pub results: Vec<T>,
}

impl<T> Listing<T> {
    pub fn new(results: Vec<T>) -> Self {
        Listing { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assignee_id: Option<i64>,
}

/// Partial update for an issue.
///
/// `assignee` distinguishes "leave as is" (`None`) from "clear" (`Some(None)`)
/// and "assign" (`Some(Some(id))`).
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub status: Option<IssueStatus>,
    pub assignee: Option<Option<i64>>,
}

impl IssueUpdate {
    pub fn status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn assign(mut self, user_id: i64) -> Self {
        self.assignee = Some(Some(user_id));
        self
    }

    pub fn unassign(mut self) -> Self {
        self.assignee = Some(None);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assignee.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct IssueFilters {
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub search: Option<String>,
}

impl IssueFilters {
    pub fn matches(&self, issue: &Issue) -> bool {
        if let Some(status) = self.status {
            if issue.status != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if issue.priority != priority {
                return false;
            }
        }
        match self.search.as_deref() {
            Some(query) if !query.is_empty() => {
                let needle = query.to_lowercase();
                issue.title.to_lowercase().contains(&needle)
                    || issue.description.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActivityFilter {
    pub project: Option<i64>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStats {
    pub total: usize,
    pub by_status: std::collections::BTreeMap<IssueStatus, usize>,
    pub by_priority: std::collections::BTreeMap<Priority, usize>,
}

impl IssueStats {
    pub fn count_status(&self, status: IssueStatus) -> usize {
        self.by_status.get(&status).copied().unwrap_or(0)
    }

    pub fn count_priority(&self, priority: Priority) -> usize {
        self.by_priority.get(&priority).copied().unwrap_or(0)
    }
}

/// Full dump of every collection, used for backup and restore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: i32,
    pub exported_at: DateTime<Utc>,
    pub users: Vec<User>,
    pub projects: Vec<Project>,
    pub issues: Vec<Issue>,
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub activities: Vec<Activity>,
}
