use anyhow::Result;

use bugtrack::models::{NewIssue, Priority};
use bugtrack::Tracker;

pub fn run(
    tracker: &Tracker,
    project_id: i64,
    title: &str,
    description: Option<&str>,
    priority: &str,
    assignee_id: Option<i64>,
) -> Result<()> {
    let priority: Priority = priority.parse()?;

    let issue = tracker.create_issue(
        project_id,
        NewIssue {
            title: title.to_string(),
            description: description.unwrap_or_default().to_string(),
            priority,
            assignee_id,
        },
    )?;

    println!("Created issue #{} in {}", issue.id, issue.project_name);
    if assignee_id.is_some() && issue.assignee.is_none() {
        println!("Note: assignee not found, issue left unassigned");
    }
    Ok(())
}
