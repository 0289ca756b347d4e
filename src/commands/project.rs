use anyhow::Result;

use bugtrack::models::{IssueFilters, NewProject};
use bugtrack::Tracker;

use super::list::truncate;

pub fn list(tracker: &Tracker, search: Option<&str>) -> Result<()> {
    let needle = search.map(str::to_lowercase);
    let projects: Vec<_> = tracker
        .get_projects()?
        .results
        .into_iter()
        .filter(|p| match &needle {
            Some(n) => p.name.to_lowercase().contains(n) || p.description.to_lowercase().contains(n),
            None => true,
        })
        .collect();

    if projects.is_empty() {
        println!("No projects found.");
        return Ok(());
    }

    for project in projects {
        println!(
            "#{:<14} {:<32} {:>3} issues  {}",
            project.id,
            truncate(&project.name, 32),
            project.issues_count,
            project.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

pub fn create(tracker: &Tracker, name: &str, description: Option<&str>) -> Result<()> {
    let project = tracker.create_project(NewProject {
        name: name.to_string(),
        description: description.unwrap_or_default().to_string(),
    })?;
    println!("Created project #{}: {}", project.id, project.name);
    Ok(())
}

pub fn show(tracker: &Tracker, id: i64) -> Result<()> {
    let project = tracker.get_project(id)?;

    println!("Project #{}: {}", project.id, project.name);
    println!("Created: {}", project.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!(
        "Created by: {} ({})",
        project.created_by.username,
        project.created_by.display_name()
    );
    println!("Issues: {}", project.issues_count);

    if !project.description.is_empty() {
        println!("\nDescription:");
        for line in project.description.lines() {
            println!("  {}", line);
        }
    }

    let issues = tracker.get_issues(id, &IssueFilters::default())?;
    if !issues.is_empty() {
        println!("\nIssues:");
        for issue in issues.results {
            println!(
                "  #{} [{}] {} - {}",
                issue.id, issue.status, issue.priority, issue.title
            );
        }
    }

    Ok(())
}
