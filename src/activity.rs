//! Audit trail of issue changes, newest first when listed.

use chrono::Utc;

use crate::collections::Table;
use crate::error::Result;
use crate::models::{Activity, ActivityAction, ActivityFilter, Issue, User};
use crate::storage::{keys, KeyValueStore};

pub fn record(
    store: &dyn KeyValueStore,
    user: &User,
    issue: &Issue,
    action: ActivityAction,
    description: String,
) -> Result<Activity> {
    let mut activities: Table<Activity> = Table::load(store, keys::ACTIVITIES)?;
    let activity = Activity {
        id: activities.allocate_id(),
        action,
        description,
        created_at: Utc::now(),
        user: user.clone(),
        issue: issue.id,
        project: issue.project,
    };
    activities.insert(activity.clone());
    activities.save(store, keys::ACTIVITIES)?;
    Ok(activity)
}

pub fn list(store: &dyn KeyValueStore, filter: ActivityFilter) -> Result<Vec<Activity>> {
    let activities: Table<Activity> = Table::load(store, keys::ACTIVITIES)?;
    let mut matching: Vec<Activity> = activities
        .into_rows()
        .into_iter()
        .filter(|a| filter.project.map_or(true, |project| a.project == project))
        .collect();
    // Entries sharing a timestamp stay in insertion order, so the reverse lists the latest first.
    matching.sort_by_key(|a| a.created_at);
    matching.reverse();
    if let Some(limit) = filter.limit {
        matching.truncate(limit);
    }
    Ok(matching)
}

pub fn status_change_description(issue: &Issue, old: &Issue) -> Option<String> {
    (old.status != issue.status).then(|| {
        format!(
            "Changed status from {} to {}",
            old.status.label(),
            issue.status.label()
        )
    })
}

pub fn assignment_description(issue: &Issue, old: &Issue) -> Option<String> {
    let before = old.assignee.as_ref().map(|u| u.id);
    let after = issue.assignee.as_ref().map(|u| u.id);
    if before == after {
        return None;
    }
    Some(match &issue.assignee {
        Some(user) => format!("Assigned to {}", user.username),
        None => "Unassigned".to_string(),
    })
}
