use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};

use bugtrack::models::{Issue, IssueStatus, Snapshot};
use bugtrack::Tracker;

pub fn run_json(tracker: &Tracker, output_path: Option<&str>) -> Result<()> {
    let snapshot = tracker.export_snapshot()?;
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output_path {
        Some(path) => {
            fs::write(path, json).context("Failed to write export file")?;
            eprintln!(
                "Exported {} issues across {} projects to {}",
                snapshot.issues.len(),
                snapshot.projects.len(),
                path
            );
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

pub fn run_markdown(tracker: &Tracker, output_path: Option<&str>) -> Result<()> {
    let snapshot = tracker.export_snapshot()?;
    let md = render_markdown(&snapshot);

    match output_path {
        Some(path) => {
            fs::write(path, md).context("Failed to write export file")?;
            eprintln!("Exported {} issues to {}", snapshot.issues.len(), path);
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", md)?;
        }
    }
    Ok(())
}

pub fn import(tracker: &Tracker, path: &str) -> Result<()> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let snapshot: Snapshot =
        serde_json::from_str(&content).context("Import file is not a valid snapshot")?;

    let (users, projects, issues) = (
        snapshot.users.len(),
        snapshot.projects.len(),
        snapshot.issues.len(),
    );
    tracker.restore_snapshot(snapshot)?;

    println!(
        "Imported {} users, {} projects and {} issues from {}",
        users, projects, issues, path
    );
    Ok(())
}

fn render_markdown(snapshot: &Snapshot) -> String {
    let mut md = String::new();

    md.push_str("# Bug Tracker Export\n\n");
    md.push_str(&format!(
        "Exported: {}\n\n",
        snapshot.exported_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    for project in &snapshot.projects {
        md.push_str(&format!("## {} (#{})\n\n", project.name, project.id));
        if !project.description.is_empty() {
            md.push_str(&format!("{}\n\n", project.description));
        }

        for status in IssueStatus::ALL {
            let issues: Vec<_> = snapshot
                .issues
                .iter()
                .filter(|i| i.project == project.id && i.status == status)
                .collect();
            if issues.is_empty() {
                continue;
            }

            md.push_str(&format!("### {}\n\n", status.label()));
            for issue in issues {
                write_issue_md(&mut md, snapshot, issue);
            }
        }
    }
    md
}

fn write_issue_md(md: &mut String, snapshot: &Snapshot, issue: &Issue) {
    let checkbox = if issue.status == IssueStatus::Closed {
        "[x]"
    } else {
        "[ ]"
    };

    md.push_str(&format!(
        "#### {} #{}: {}\n\n",
        checkbox, issue.id, issue.title
    ));
    md.push_str(&format!("- **Priority:** {}\n", issue.priority));
    md.push_str(&format!("- **Reporter:** {}\n", issue.reporter.username));
    if let Some(ref assignee) = issue.assignee {
        md.push_str(&format!("- **Assignee:** {}\n", assignee.username));
    }
    md.push_str(&format!(
        "- **Created:** {}\n",
        issue.created_at.format("%Y-%m-%d")
    ));

    if !issue.description.is_empty() {
        md.push_str(&format!("\n{}\n", issue.description));
    }

    let comments: Vec<_> = snapshot
        .comments
        .iter()
        .filter(|c| c.issue_id == issue.id)
        .collect();
    if !comments.is_empty() {
        md.push_str("\n**Comments:**\n");
        for comment in comments {
            md.push_str(&format!(
                "- [{}] {}: {}\n",
                comment.created_at.format("%Y-%m-%d %H:%M"),
                comment.author.username,
                comment.content
            ));
        }
    }

    md.push_str("\n---\n\n");
}
