use anyhow::{bail, Result};

use bugtrack::models::{IssueStatus, IssueUpdate};
use bugtrack::Tracker;

pub fn run(
    tracker: &Tracker,
    id: i64,
    status: Option<&str>,
    assignee: Option<i64>,
    unassign: bool,
) -> Result<()> {
    if assignee.is_some() && unassign {
        bail!("--assignee and --unassign cannot be combined");
    }

    let mut update = IssueUpdate::default();
    if let Some(s) = status {
        update = update.status(s.parse::<IssueStatus>()?);
    }
    if let Some(user_id) = assignee {
        update = update.assign(user_id);
    }
    if unassign {
        update = update.unassign();
    }
    if update.is_empty() {
        bail!("Nothing to update. Use --status, --assignee, or --unassign");
    }

    let issue = tracker.update_issue(id, update)?;
    println!("Updated issue #{}", issue.id);
    if assignee.is_some() && issue.assignee.is_none() {
        println!("Note: assignee not found, issue is now unassigned");
    }
    Ok(())
}
