//! Demo data for a fresh store.
//!
//! Each collection is seeded independently and only while it is empty, so
//! calling [`initialize_demo_data`] repeatedly is harmless.

use chrono::Utc;
use tracing::info;

use crate::collections::{Table, UserDirectory};
use crate::error::Result;
use crate::models::{Issue, IssueStatus, Priority, Project, User};
use crate::storage::{keys, KeyValueStore};

pub const DEMO_PROJECT_ID: i64 = 1;
pub const DEMO_PROJECT_NAME: &str = "Demo Project";

pub fn demo_user() -> User {
    User {
        id: 1,
        username: "demo".to_string(),
        email: "demo@example.com".to_string(),
        first_name: "Demo".to_string(),
        last_name: "User".to_string(),
    }
}

pub fn demo_users() -> Vec<User> {
    vec![
        demo_user(),
        User {
            id: 2,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            first_name: "Admin".to_string(),
            last_name: "User".to_string(),
        },
    ]
}

pub fn initialize_demo_data(store: &dyn KeyValueStore) -> Result<()> {
    let mut users = UserDirectory::load(store, keys::USERS)?;

    // Project and issues reference the users present before seeding.
    let mut existing = users.iter();
    let owner = match existing.next() {
        Some(user) => user.clone(),
        None => demo_user(),
    };
    let second = existing.next().cloned();

    if users.is_empty() {
        for user in demo_users() {
            users.insert(user);
        }
        users.save(store, keys::USERS)?;
        info!("seeded demo users");
    }

    let mut projects: Table<Project> = Table::load(store, keys::PROJECTS)?;
    if projects.is_empty() {
        projects.insert(Project {
            id: DEMO_PROJECT_ID,
            name: DEMO_PROJECT_NAME.to_string(),
            description: "A sample project to demonstrate the bug tracking system".to_string(),
            created_at: Utc::now(),
            created_by: owner.clone(),
            issues_count: 2,
        });
        projects.save(store, keys::PROJECTS)?;
        info!("seeded demo project");
    }

    let mut issues: Table<Issue> = Table::load(store, keys::ISSUES)?;
    if issues.is_empty() {
        let now = Utc::now();
        issues.insert(Issue {
            id: 1,
            title: "Sample Bug Report".to_string(),
            description: "This is a sample bug report to demonstrate the system".to_string(),
            status: IssueStatus::Open,
            priority: Priority::Medium,
            created_at: now,
            updated_at: now,
            project: DEMO_PROJECT_ID,
            project_name: DEMO_PROJECT_NAME.to_string(),
            reporter: owner.clone(),
            assignee: None,
            comments_count: 1,
        });
        issues.insert(Issue {
            id: 2,
            title: "Feature Request".to_string(),
            description: "This is a sample feature request".to_string(),
            status: IssueStatus::InProgress,
            priority: Priority::High,
            created_at: now,
            updated_at: now,
            project: DEMO_PROJECT_ID,
            project_name: DEMO_PROJECT_NAME.to_string(),
            reporter: owner,
            assignee: second,
            comments_count: 0,
        });
        issues.save(store, keys::ISSUES)?;
        info!("seeded demo issues");
    }

    Ok(())
}
