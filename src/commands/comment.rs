use anyhow::{bail, Result};

use bugtrack::Tracker;

pub fn run(tracker: &Tracker, issue_id: i64, content: &str) -> Result<()> {
    if content.trim().is_empty() {
        bail!("Comment text cannot be empty");
    }

    let comment = tracker.create_comment(issue_id, content)?;
    println!("Added comment #{} to issue #{}", comment.id, issue_id);
    Ok(())
}
