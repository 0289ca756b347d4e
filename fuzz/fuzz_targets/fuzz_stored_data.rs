#![no_main]

//! Fuzz target for corrupt store contents.
//!
//! Arbitrary text is written under the collection and session keys before
//! every read path runs. Bad JSON must surface as an error, never a panic.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use bugtrack::db::Database;
use bugtrack::latency::NoLatency;
use bugtrack::models::{ActivityFilter, IssueFilters};
use bugtrack::storage::{keys, KeyValueStore};
use bugtrack::Tracker;

#[derive(Arbitrary, Debug)]
struct StoredInput {
    users: Option<String>,
    projects: Option<String>,
    issues: Option<String>,
    comments: Option<String>,
    current_user: Option<String>,
}

fuzz_target!(|input: StoredInput| {
    let db = match Database::open_in_memory() {
        Ok(d) => d,
        Err(_) => return,
    };

    let entries = [
        (keys::USERS, &input.users),
        (keys::PROJECTS, &input.projects),
        (keys::ISSUES, &input.issues),
        (keys::COMMENTS, &input.comments),
        (keys::CURRENT_USER, &input.current_user),
    ];
    for (key, value) in entries {
        if let Some(value) = value {
            if db.set(key, value).is_err() {
                return;
            }
        }
    }

    let tracker = Tracker::new(Box::new(db), Box::new(NoLatency));
    let _ = tracker.current_user();
    let _ = tracker.get_users();
    let _ = tracker.get_projects();
    let _ = tracker.get_issues(1, &IssueFilters::default());
    let _ = tracker.get_issue(1);
    let _ = tracker.get_comments(1);
    let _ = tracker.get_activities(ActivityFilter::default());
    let _ = tracker.issue_stats(None);
    let _ = tracker.export_snapshot();
    let _ = tracker.login("demo", "");
});
