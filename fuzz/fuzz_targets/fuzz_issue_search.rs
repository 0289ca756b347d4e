#![no_main]

//! Fuzz target for issue creation and filtering.
//!
//! Titles, descriptions and search terms can hold any Unicode. Filtering
//! lowercases both sides, so multi-byte and case-changing characters must
//! never panic.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use bugtrack::models::{IssueFilters, IssueStatus, IssueUpdate, NewIssue, Priority};
use bugtrack::Tracker;

#[derive(Arbitrary, Debug)]
struct SearchInput {
    title: String,
    description: String,
    search: String,
    num_issues: u8,
    close_first: bool,
}

fuzz_target!(|input: SearchInput| {
    let num_issues = (input.num_issues % 10).max(1);

    let tracker = Tracker::in_memory();
    if tracker.login("demo", "").is_err() {
        return;
    }

    let mut created = Vec::new();
    for i in 0..num_issues {
        let new_issue = NewIssue {
            title: format!("{} {}", input.title, i),
            description: input.description.clone(),
            priority: Priority::ALL[usize::from(i) % Priority::ALL.len()],
            assignee_id: None,
        };
        if let Ok(issue) = tracker.create_issue(1, new_issue) {
            created.push(issue.id);
        }
    }

    if input.close_first {
        if let Some(id) = created.first() {
            let _ = tracker.update_issue(*id, IssueUpdate::default().status(IssueStatus::Closed));
        }
    }

    let filters = IssueFilters {
        status: None,
        priority: None,
        search: Some(input.search.clone()),
    };
    let _ = tracker.get_issues(1, &filters);
    let _ = tracker.get_issues(1, &IssueFilters::default());
    let _ = tracker.issue_stats(Some(1));

    if let Some(id) = created.first() {
        let _ = tracker.create_comment(*id, &input.search);
        let _ = tracker.get_issue(*id);
    }
    let _ = tracker.search_users(&input.search);
});
