use anyhow::Result;

use bugtrack::Tracker;

pub fn run(tracker: &Tracker, id: i64) -> Result<()> {
    let detail = tracker.get_issue(id)?;
    let issue = &detail.issue;

    println!("Issue #{}: {}", issue.id, issue.title);
    println!("Project: {} (#{})", issue.project_name, issue.project);
    println!("Status: {}", issue.status);
    println!("Priority: {}", issue.priority);
    println!("Reporter: {}", issue.reporter.username);
    match &issue.assignee {
        Some(user) => println!("Assignee: {}", user.username),
        None => println!("Assignee: (none)"),
    }
    println!("Created: {}", issue.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("Updated: {}", issue.updated_at.format("%Y-%m-%d %H:%M:%S"));

    if !issue.description.is_empty() {
        println!("\nDescription:");
        for line in issue.description.lines() {
            println!("  {}", line);
        }
    }

    println!("\nComments ({}):", issue.comments_count);
    if detail.comments.is_empty() {
        println!("  (none)");
    }
    for comment in &detail.comments {
        println!(
            "  [{}] {}: {}",
            comment.created_at.format("%Y-%m-%d %H:%M"),
            comment.author.username,
            comment.content
        );
    }

    Ok(())
}
