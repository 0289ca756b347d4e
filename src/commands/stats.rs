use anyhow::Result;

use bugtrack::models::{IssueStatus, Priority};
use bugtrack::Tracker;

pub fn run(tracker: &Tracker, project: Option<i64>) -> Result<()> {
    if let Some(id) = project {
        let project = tracker.get_project(id)?;
        println!("Project #{}: {}", project.id, project.name);
    }

    let stats = tracker.issue_stats(project)?;
    println!("Total issues: {}", stats.total);

    println!("\nBy status:");
    for status in IssueStatus::ALL {
        println!("  {:<12} {}", status.label(), stats.count_status(status));
    }

    println!("\nBy priority:");
    for priority in Priority::ALL {
        println!("  {:<12} {}", priority, stats.count_priority(priority));
    }

    Ok(())
}
