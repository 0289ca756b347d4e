use anyhow::Result;

use bugtrack::models::{IssueFilters, IssueStatus, Priority};
use bugtrack::Tracker;

pub fn run(
    tracker: &Tracker,
    project_id: i64,
    status: Option<&str>,
    priority: Option<&str>,
    search: Option<&str>,
) -> Result<()> {
    let filters = IssueFilters {
        status: status.map(str::parse::<IssueStatus>).transpose()?,
        priority: priority.map(str::parse::<Priority>).transpose()?,
        search: search.map(str::to_string),
    };
    let issues = tracker.get_issues(project_id, &filters)?;

    if issues.is_empty() {
        println!("No issues found.");
        return Ok(());
    }

    for issue in issues.results {
        let status_display = format!("[{}]", issue.status);
        let date = issue.created_at.format("%Y-%m-%d");
        println!(
            "#{:<14} {:13} {:<40} {:8} {}",
            issue.id,
            status_display,
            truncate(&issue.title, 40),
            issue.priority,
            date
        );
    }

    Ok(())
}

pub fn truncate(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_truncate_short() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long() {
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("日本語のタイトルです", 6), "日本語...");
    }

    #[test]
    fn test_list_demo_project() {
        let tracker = Tracker::in_memory();
        tracker.get_projects().unwrap();
        assert!(run(&tracker, 1, Some("open"), None, None).is_ok());
        assert!(run(&tracker, 1, None, Some("high"), Some("feature")).is_ok());
    }

    #[test]
    fn test_list_invalid_status() {
        let tracker = Tracker::in_memory();
        let result = run(&tracker, 1, Some("done"), None, None);
        assert!(result.unwrap_err().to_string().contains("Invalid status"));
    }

    #[test]
    fn test_list_invalid_priority() {
        let tracker = Tracker::in_memory();
        let result = run(&tracker, 1, None, Some("urgent"), None);
        assert!(result.unwrap_err().to_string().contains("Invalid priority"));
    }

    proptest! {
        #[test]
        fn prop_truncate_respects_limit(s in "\\PC{0,80}", max in 3usize..50) {
            let out = truncate(&s, max);
            prop_assert!(out.chars().count() <= max);
        }
    }
}
