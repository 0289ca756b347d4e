//! The tracker façade: every user-facing operation on the store.
//!
//! A [`Tracker`] owns a [`KeyValueStore`] and a [`LatencyHook`]. Each
//! operation that touches collections pauses once on the hook, then performs
//! its whole read-modify-write before returning. Session state (the current
//! user and its tokens) lives in the same store, so a tracker reopened over a
//! persistent backend picks up where the last process left off.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::activity;
use crate::collections::{Table, UserDirectory};
use crate::error::{Result, TrackerError};
use crate::latency::{LatencyHook, NoLatency};
use crate::models::{
    Activity, ActivityAction, ActivityFilter, AuthSession, Comment, Issue, IssueDetail,
    IssueFilters, IssueStats, IssueStatus, IssueUpdate, Listing, NewIssue, NewProject, NewUser,
    Priority, Project, Snapshot, User,
};
use crate::seed;
use crate::session;
use crate::storage::{keys, KeyValueStore, MemoryStore};

pub const SNAPSHOT_VERSION: i32 = 1;

pub struct Tracker {
    store: Box<dyn KeyValueStore>,
    latency: Box<dyn LatencyHook>,
}

impl Tracker {
    pub fn new(store: Box<dyn KeyValueStore>, latency: Box<dyn LatencyHook>) -> Self {
        Tracker { store, latency }
    }

    /// Fresh in-memory store, no artificial latency.
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStore::new()), Box::new(NoLatency))
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    fn users(&self) -> Result<UserDirectory> {
        UserDirectory::load(self.store(), keys::USERS)
    }

    fn projects(&self) -> Result<Table<Project>> {
        Table::load(self.store(), keys::PROJECTS)
    }

    fn issues(&self) -> Result<Table<Issue>> {
        Table::load(self.store(), keys::ISSUES)
    }

    fn comments(&self) -> Result<Table<Comment>> {
        Table::load(self.store(), keys::COMMENTS)
    }

    /// Failures are logged, never returned: the triggering write is already saved.
    fn log_activity(&self, actor: &User, issue: &Issue, action: ActivityAction, description: String) {
        if let Err(err) = activity::record(self.store(), actor, issue, action, description) {
            warn!(issue_id = issue.id, ?action, error = %err, "activity not recorded");
        }
    }

    // Auth

    /// Log in as `username`. The password is not checked.
    pub fn login(&self, username: &str, _password: &str) -> Result<AuthSession> {
        self.latency.pause();
        seed::initialize_demo_data(self.store())?;

        let users = self.users()?;
        let user = users
            .find_by_username(username)
            .cloned()
            .ok_or_else(|| TrackerError::Authentication("Invalid username or password".to_string()))?;

        let tokens = session::establish(self.store(), &user)?;
        info!(user_id = user.id, username = %user.username, "logged in");
        Ok(AuthSession { user, tokens })
    }

    pub fn register(&self, new_user: NewUser) -> Result<AuthSession> {
        self.latency.pause();
        seed::initialize_demo_data(self.store())?;

        if new_user.username.is_empty() || new_user.email.is_empty() {
            return Err(TrackerError::Validation(
                "Username and email are required".to_string(),
            ));
        }

        let mut users = self.users()?;
        if users.username_taken(&new_user.username) {
            return Err(TrackerError::Validation("Username already exists".to_string()));
        }
        if users.email_taken(&new_user.email) {
            return Err(TrackerError::Validation("Email already exists".to_string()));
        }

        let user = User {
            id: users.allocate_id(),
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name.unwrap_or_default(),
            last_name: new_user.last_name.unwrap_or_default(),
        };
        users.insert(user.clone());
        users.save(self.store(), keys::USERS)?;

        let tokens = session::establish(self.store(), &user)?;
        info!(user_id = user.id, username = %user.username, "registered");
        Ok(AuthSession { user, tokens })
    }

    pub fn logout(&self) -> Result<()> {
        session::clear(self.store())?;
        info!("logged out");
        Ok(())
    }

    pub fn current_user(&self) -> Result<Option<User>> {
        session::current_user(self.store())
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        session::is_authenticated(self.store())
    }

    // Projects

    pub fn get_projects(&self) -> Result<Listing<Project>> {
        self.latency.pause();
        seed::initialize_demo_data(self.store())?;

        let issues = self.issues()?;
        let projects = self
            .projects()?
            .into_rows()
            .into_iter()
            .map(|mut project| {
                project.issues_count = count_project_issues(&issues, project.id);
                project
            })
            .collect::<Vec<_>>();

        debug!(count = projects.len(), "listed projects");
        Ok(Listing::new(projects))
    }

    pub fn create_project(&self, new_project: NewProject) -> Result<Project> {
        self.latency.pause();
        let creator = session::require_user(self.store())?;

        let mut projects = self.projects()?;
        let project = Project {
            id: projects.allocate_id(),
            name: new_project.name,
            description: new_project.description,
            created_at: Utc::now(),
            created_by: creator,
            issues_count: 0,
        };
        projects.insert(project.clone());
        projects.save(self.store(), keys::PROJECTS)?;

        info!(project_id = project.id, name = %project.name, "created project");
        Ok(project)
    }

    /// The returned `issues_count` is recomputed; the stored record is left alone.
    pub fn get_project(&self, id: i64) -> Result<Project> {
        self.latency.pause();

        let mut project = self
            .projects()?
            .get(id)
            .cloned()
            .ok_or_else(TrackerError::project_not_found)?;
        project.issues_count = count_project_issues(&self.issues()?, id);
        Ok(project)
    }

    // Issues

    pub fn get_issues(&self, project_id: i64, filters: &IssueFilters) -> Result<Listing<Issue>> {
        self.latency.pause();

        let issues = self
            .issues()?
            .into_rows()
            .into_iter()
            .filter(|issue| issue.project == project_id && filters.matches(issue))
            .collect::<Vec<_>>();

        debug!(project_id, count = issues.len(), "listed issues");
        Ok(Listing::new(issues))
    }

    pub fn create_issue(&self, project_id: i64, new_issue: NewIssue) -> Result<Issue> {
        self.latency.pause();
        let reporter = session::require_user(self.store())?;

        let projects = self.projects()?;
        let project = projects
            .get(project_id)
            .ok_or_else(TrackerError::project_not_found)?;

        let users = self.users()?;
        let assignee = new_issue
            .assignee_id
            .and_then(|id| users.get(id).cloned());

        let mut issues = self.issues()?;
        let now = Utc::now();
        let issue = Issue {
            id: issues.allocate_id(),
            title: new_issue.title,
            description: new_issue.description,
            status: IssueStatus::Open,
            priority: new_issue.priority,
            created_at: now,
            updated_at: now,
            project: project_id,
            project_name: project.name.clone(),
            reporter: reporter.clone(),
            assignee,
            comments_count: 0,
        };
        issues.insert(issue.clone());
        issues.save(self.store(), keys::ISSUES)?;

        self.log_activity(
            &reporter,
            &issue,
            ActivityAction::Created,
            format!("Created issue \"{}\"", issue.title),
        );

        info!(issue_id = issue.id, project_id, "created issue");
        Ok(issue)
    }

    pub fn update_issue(&self, id: i64, update: IssueUpdate) -> Result<Issue> {
        self.latency.pause();

        let mut issues = self.issues()?;
        let users = self.users()?;
        let issue = issues.get_mut(id).ok_or_else(TrackerError::issue_not_found)?;
        let before = issue.clone();

        if let Some(status) = update.status {
            issue.status = status;
        }
        if let Some(assignee_id) = update.assignee {
            issue.assignee = assignee_id.and_then(|uid| users.get(uid).cloned());
        }
        issue.updated_at = Utc::now();

        let updated = issue.clone();
        issues.save(self.store(), keys::ISSUES)?;

        let actor = session::current_user(self.store()).unwrap_or_else(|err| {
            warn!(issue_id = id, error = %err, "unreadable session; change not attributed");
            None
        });
        if let Some(actor) = actor {
            if let Some(description) = activity::status_change_description(&updated, &before) {
                self.log_activity(&actor, &updated, ActivityAction::StatusChanged, description);
            }
            if let Some(description) = activity::assignment_description(&updated, &before) {
                self.log_activity(&actor, &updated, ActivityAction::Assigned, description);
            }
        }

        info!(issue_id = id, status = %updated.status, "updated issue");
        Ok(updated)
    }

    pub fn get_issue(&self, id: i64) -> Result<IssueDetail> {
        self.latency.pause();

        let issue = self
            .issues()?
            .get(id)
            .cloned()
            .ok_or_else(TrackerError::issue_not_found)?;
        let comments = comments_for(&self.comments()?, id);
        Ok(IssueDetail { issue, comments })
    }

    // Comments

    pub fn get_comments(&self, issue_id: i64) -> Result<Listing<Comment>> {
        self.latency.pause();
        Ok(Listing::new(comments_for(&self.comments()?, issue_id)))
    }

    pub fn create_comment(&self, issue_id: i64, content: &str) -> Result<Comment> {
        self.latency.pause();
        let author = session::require_user(self.store())?;

        let mut comments = self.comments()?;
        let comment = Comment {
            id: comments.allocate_id(),
            issue_id,
            content: content.to_string(),
            created_at: Utc::now(),
            author: author.clone(),
        };
        comments.insert(comment.clone());
        comments.save(self.store(), keys::COMMENTS)?;

        let mut issues = self.issues()?;
        match issues.get_mut(issue_id) {
            Some(issue) => {
                issue.comments_count += 1;
                let issue = issue.clone();
                issues.save(self.store(), keys::ISSUES)?;
                self.log_activity(
                    &author,
                    &issue,
                    ActivityAction::Commented,
                    format!("Commented on \"{}\"", issue.title),
                );
            }
            None => warn!(issue_id, "comment added to unknown issue; count not updated"),
        }

        info!(comment_id = comment.id, issue_id, "created comment");
        Ok(comment)
    }

    // Users

    pub fn get_users(&self) -> Result<Listing<User>> {
        self.latency.pause();
        seed::initialize_demo_data(self.store())?;
        Ok(Listing::new(self.users()?.into_rows()))
    }

    /// Case-insensitive match on username, first name, last name or email.
    pub fn search_users(&self, query: &str) -> Result<Listing<User>> {
        self.latency.pause();
        seed::initialize_demo_data(self.store())?;

        let needle = query.to_lowercase();
        let users = self
            .users()?
            .into_rows()
            .into_iter()
            .filter(|u| {
                needle.is_empty()
                    || [&u.username, &u.first_name, &u.last_name, &u.email]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        Ok(Listing::new(users))
    }

    // Activity and reporting

    pub fn get_activities(&self, filter: ActivityFilter) -> Result<Listing<Activity>> {
        self.latency.pause();
        Ok(Listing::new(activity::list(self.store(), filter)?))
    }

    pub fn issue_stats(&self, project_id: Option<i64>) -> Result<IssueStats> {
        self.latency.pause();

        let issues = self.issues()?;
        let mut stats = IssueStats {
            total: 0,
            by_status: IssueStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            by_priority: Priority::ALL.iter().map(|p| (*p, 0)).collect(),
        };
        for issue in issues
            .iter()
            .filter(|i| project_id.map_or(true, |p| i.project == p))
        {
            stats.total += 1;
            *stats.by_status.entry(issue.status).or_insert(0) += 1;
            *stats.by_priority.entry(issue.priority).or_insert(0) += 1;
        }
        Ok(stats)
    }

    // Backup

    pub fn export_snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            users: self.users()?.into_rows(),
            projects: self.projects()?.into_rows(),
            issues: self.issues()?.into_rows(),
            comments: self.comments()?.into_rows(),
            activities: Table::<Activity>::load(self.store(), keys::ACTIVITIES)?.into_rows(),
        })
    }

    /// Replace every collection with the snapshot's contents. Session keys are kept.
    pub fn restore_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(TrackerError::Validation(format!(
                "Unsupported snapshot version {} (expected at most {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let store = self.store();
        Table::from_rows(snapshot.users).save(store, keys::USERS)?;
        Table::from_rows(snapshot.projects).save(store, keys::PROJECTS)?;
        Table::from_rows(snapshot.issues).save(store, keys::ISSUES)?;
        Table::from_rows(snapshot.comments).save(store, keys::COMMENTS)?;
        Table::from_rows(snapshot.activities).save(store, keys::ACTIVITIES)?;

        info!("restored snapshot");
        Ok(())
    }
}

fn count_project_issues(issues: &Table<Issue>, project_id: i64) -> usize {
    issues.iter().filter(|i| i.project == project_id).count()
}

fn comments_for(comments: &Table<Comment>, issue_id: i64) -> Vec<Comment> {
    comments
        .iter()
        .filter(|c| c.issue_id == issue_id)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::ErrorKind;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn setup_logged_in() -> Tracker {
        let tracker = Tracker::in_memory();
        tracker.login("demo", "whatever").unwrap();
        tracker
    }

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret123".to_string(),
            ..Default::default()
        }
    }

    fn new_issue(title: &str) -> NewIssue {
        NewIssue {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            assignee_id: None,
        }
    }

    fn new_project(name: &str) -> NewProject {
        NewProject {
            name: name.to_string(),
            description: "desc".to_string(),
        }
    }

    struct CountingLatency(Arc<AtomicUsize>);

    impl LatencyHook for CountingLatency {
        fn pause(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    // ==================== Auth ====================

    #[test]
    fn test_login_demo_any_password() {
        let tracker = Tracker::in_memory();
        let first = tracker.login("demo", "anything").unwrap();
        let second = tracker.login("demo", "something else").unwrap();

        assert_eq!(first.user.id, 1);
        assert_eq!(second.user.id, 1);
        assert_eq!(first.user.email, "demo@example.com");
        assert!(first.tokens.access.starts_with("demo_token_1_"));
        assert!(tracker.is_authenticated().unwrap());
        assert_eq!(tracker.current_user().unwrap().unwrap().username, "demo");
    }

    #[test]
    fn test_login_unknown_user() {
        let tracker = Tracker::in_memory();
        let err = tracker.login("nobody", "pw").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.to_string(), "Invalid username or password");
        assert!(!tracker.is_authenticated().unwrap());
    }

    #[test]
    fn test_register_establishes_session() {
        let tracker = Tracker::in_memory();
        let session = tracker
            .register(NewUser {
                first_name: Some("Ada".to_string()),
                ..new_user("ada", "ada@example.com")
            })
            .unwrap();

        assert_eq!(session.user.first_name, "Ada");
        assert_eq!(session.user.last_name, "");
        assert_eq!(tracker.current_user().unwrap().unwrap().id, session.user.id);

        let users = tracker.get_users().unwrap();
        assert_eq!(users.len(), 3);
        assert!(users.results.iter().any(|u| u.username == "ada"));
    }

    #[test]
    fn test_register_duplicate_username() {
        let tracker = Tracker::in_memory();
        tracker.register(new_user("ada", "ada@example.com")).unwrap();
        let err = tracker
            .register(new_user("ada", "other@example.com"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[test]
    fn test_register_duplicate_email() {
        let tracker = Tracker::in_memory();
        tracker.register(new_user("ada", "ada@example.com")).unwrap();
        let err = tracker
            .register(new_user("grace", "ada@example.com"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");
    }

    #[test]
    fn test_register_conflicts_with_seeded_demo_user() {
        let tracker = Tracker::in_memory();
        let err = tracker
            .register(new_user("demo", "new@example.com"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[test]
    fn test_register_requires_username_and_email() {
        let tracker = Tracker::in_memory();
        let err = tracker.register(new_user("", "x@example.com")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_logout_clears_session() {
        let tracker = setup_logged_in();
        tracker.logout().unwrap();
        assert!(!tracker.is_authenticated().unwrap());
        assert!(tracker.current_user().unwrap().is_none());
        assert!(tracker.store().get(keys::REFRESH_TOKEN).unwrap().is_none());
    }

    // ==================== Projects ====================

    #[test]
    fn test_create_project_requires_session() {
        let tracker = Tracker::in_memory();
        let err = tracker.create_project(new_project("Nope")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationRequired);
    }

    #[test]
    fn test_created_project_listed_with_zero_issues() {
        let tracker = setup_logged_in();
        let project = tracker.create_project(new_project("Backend")).unwrap();
        assert_eq!(project.created_by.username, "demo");

        let listed = tracker.get_projects().unwrap();
        let found = listed.results.iter().find(|p| p.id == project.id).unwrap();
        assert_eq!(found.issues_count, 0);
        assert_eq!(found.name, "Backend");
    }

    #[test]
    fn test_issues_count_tracks_created_issues() {
        let tracker = setup_logged_in();
        let project = tracker.create_project(new_project("Counted")).unwrap();
        for i in 0..3 {
            tracker
                .create_issue(project.id, new_issue(&format!("Issue {}", i)))
                .unwrap();
        }

        let listed = tracker.get_projects().unwrap();
        let found = listed.results.iter().find(|p| p.id == project.id).unwrap();
        assert_eq!(found.issues_count, 3);
        assert_eq!(tracker.get_project(project.id).unwrap().issues_count, 3);
    }

    #[test]
    fn test_seeded_project_count_is_recomputed() {
        let tracker = Tracker::in_memory();
        let projects = tracker.get_projects().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects.results[0].issues_count, 2);
    }

    #[test]
    fn test_get_project_not_found() {
        let tracker = Tracker::in_memory();
        let err = tracker.get_project(424242).unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
    }

    // ==================== Issues ====================

    #[test]
    fn test_create_issue_defaults() {
        let tracker = setup_logged_in();
        let issue = tracker
            .create_issue(
                seed::DEMO_PROJECT_ID,
                NewIssue {
                    assignee_id: Some(2),
                    priority: Priority::Critical,
                    ..new_issue("Broken build")
                },
            )
            .unwrap();

        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(issue.priority, Priority::Critical);
        assert_eq!(issue.comments_count, 0);
        assert_eq!(issue.project_name, seed::DEMO_PROJECT_NAME);
        assert_eq!(issue.reporter.username, "demo");
        assert_eq!(issue.assignee.unwrap().username, "admin");
        assert_eq!(issue.created_at, issue.updated_at);
    }

    #[test]
    fn test_create_issue_unknown_assignee_is_none() {
        let tracker = setup_logged_in();
        let issue = tracker
            .create_issue(
                seed::DEMO_PROJECT_ID,
                NewIssue {
                    assignee_id: Some(999),
                    ..new_issue("Orphan")
                },
            )
            .unwrap();
        assert!(issue.assignee.is_none());
    }

    #[test]
    fn test_create_issue_requires_session_and_project() {
        let tracker = Tracker::in_memory();
        let err = tracker.create_issue(1, new_issue("x")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationRequired);

        tracker.login("demo", "").unwrap();
        let err = tracker.create_issue(31337, new_issue("x")).unwrap_err();
        assert_eq!(err.to_string(), "Project not found");
    }

    #[test]
    fn test_get_issues_filters() {
        let tracker = setup_logged_in();
        let project = tracker.create_project(new_project("Filtered")).unwrap();
        tracker
            .create_issue(
                project.id,
                NewIssue {
                    description: "Crashes on startup".to_string(),
                    priority: Priority::High,
                    ..new_issue("Crash")
                },
            )
            .unwrap();
        let typo = tracker
            .create_issue(
                project.id,
                NewIssue {
                    priority: Priority::Low,
                    ..new_issue("Typo in footer")
                },
            )
            .unwrap();
        tracker
            .update_issue(typo.id, IssueUpdate::default().status(IssueStatus::Closed))
            .unwrap();

        let all = tracker.get_issues(project.id, &IssueFilters::default()).unwrap();
        assert_eq!(all.len(), 2);

        let closed = tracker
            .get_issues(
                project.id,
                &IssueFilters {
                    status: Some(IssueStatus::Closed),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed.results[0].id, typo.id);

        let startup = tracker
            .get_issues(
                project.id,
                &IssueFilters {
                    search: Some("STARTUP".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(startup.len(), 1);
        assert_eq!(startup.results[0].title, "Crash");

        let none = tracker
            .get_issues(
                project.id,
                &IssueFilters {
                    priority: Some(Priority::High),
                    search: Some("footer".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_get_issues_scoped_to_project() {
        let tracker = setup_logged_in();
        let project = tracker.create_project(new_project("Empty")).unwrap();
        let issues = tracker.get_issues(project.id, &IssueFilters::default()).unwrap();
        assert!(issues.is_empty());

        let demo = tracker
            .get_issues(seed::DEMO_PROJECT_ID, &IssueFilters::default())
            .unwrap();
        assert_eq!(demo.len(), 2);
    }

    #[test]
    fn test_update_issue_clears_assignee() {
        let tracker = setup_logged_in();
        let issue = tracker.update_issue(2, IssueUpdate::default().assign(2)).unwrap();
        assert_eq!(issue.assignee.as_ref().unwrap().username, "admin");

        let updated = tracker.update_issue(2, IssueUpdate::default().unassign()).unwrap();
        assert!(updated.assignee.is_none());
        assert_eq!(updated.status, issue.status);
        assert!(tracker.get_issue(2).unwrap().issue.assignee.is_none());
    }

    #[test]
    fn test_empty_update_only_touches_updated_at() {
        let tracker = setup_logged_in();
        let before = tracker.get_issue(2).unwrap().issue;
        std::thread::sleep(std::time::Duration::from_millis(5));

        let after = tracker.update_issue(2, IssueUpdate::default()).unwrap();
        assert_eq!(after.status, before.status);
        assert_eq!(
            after.assignee.as_ref().map(|u| u.id),
            before.assignee.as_ref().map(|u| u.id)
        );
        assert!(after.updated_at > before.updated_at);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn test_update_issue_assigns_and_sets_status() {
        let tracker = setup_logged_in();
        let updated = tracker
            .update_issue(
                1,
                IssueUpdate::default().status(IssueStatus::InProgress).assign(1),
            )
            .unwrap();
        assert_eq!(updated.status, IssueStatus::InProgress);
        assert_eq!(updated.assignee.unwrap().username, "demo");
    }

    #[test]
    fn test_update_issue_unknown_assignee_clears() {
        let tracker = setup_logged_in();
        tracker.update_issue(2, IssueUpdate::default().assign(1)).unwrap();
        let updated = tracker.update_issue(2, IssueUpdate::default().assign(777)).unwrap();
        assert!(updated.assignee.is_none());
    }

    #[test]
    fn test_update_missing_issue() {
        let tracker = Tracker::in_memory();
        let err = tracker.update_issue(5, IssueUpdate::default()).unwrap_err();
        assert_eq!(err.to_string(), "Issue not found");
    }

    #[test]
    fn test_update_works_without_session() {
        let tracker = Tracker::in_memory();
        tracker.get_projects().unwrap();
        let updated = tracker
            .update_issue(1, IssueUpdate::default().status(IssueStatus::Closed))
            .unwrap();
        assert_eq!(updated.status, IssueStatus::Closed);
        // Nobody to attribute the change to
        assert!(tracker.get_activities(ActivityFilter::default()).unwrap().is_empty());
    }

    // ==================== Comments ====================

    #[test]
    fn test_seeded_issue_has_no_comments() {
        let tracker = Tracker::in_memory();
        tracker.get_projects().unwrap();
        let detail = tracker.get_issue(1).unwrap();
        assert!(detail.comments.is_empty());
        assert_eq!(detail.issue.comments_count, 1);
    }

    #[test]
    fn test_create_comment_increments_count() {
        let tracker = setup_logged_in();
        let comment = tracker.create_comment(2, "Looking into it").unwrap();
        assert_eq!(comment.author.username, "demo");
        assert_eq!(comment.issue_id, 2);

        let detail = tracker.get_issue(2).unwrap();
        assert_eq!(detail.issue.comments_count, 1);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].content, "Looking into it");

        tracker.create_comment(2, "Fixed").unwrap();
        assert_eq!(tracker.get_issue(2).unwrap().issue.comments_count, 2);
        assert_eq!(tracker.get_comments(2).unwrap().len(), 2);
        assert!(tracker.get_comments(1).unwrap().is_empty());
    }

    #[test]
    fn test_create_comment_requires_session() {
        let tracker = Tracker::in_memory();
        tracker.get_projects().unwrap();
        let err = tracker.create_comment(1, "hi").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AuthorizationRequired);
        assert_eq!(tracker.get_issue(1).unwrap().issue.comments_count, 1);
    }

    #[test]
    fn test_comment_on_unknown_issue_is_kept_without_count() {
        let tracker = setup_logged_in();
        let comment = tracker.create_comment(123456, "lost").unwrap();
        assert_eq!(comment.issue_id, 123456);
        assert_eq!(tracker.get_comments(123456).unwrap().len(), 1);
        assert!(tracker.get_issue(123456).is_err());
    }

    // ==================== Users, activity, stats ====================

    #[test]
    fn test_search_users() {
        let tracker = Tracker::in_memory();
        assert_eq!(tracker.search_users("ADMIN").unwrap().len(), 1);
        assert_eq!(tracker.search_users("user").unwrap().len(), 2);
        assert_eq!(tracker.search_users("").unwrap().len(), 2);
        assert!(tracker.search_users("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_activity_trail() {
        let tracker = setup_logged_in();
        let issue = tracker.create_issue(1, new_issue("Tracked")).unwrap();
        tracker
            .update_issue(issue.id, IssueUpdate::default().status(IssueStatus::Closed).assign(2))
            .unwrap();
        tracker.create_comment(issue.id, "done").unwrap();

        let trail = tracker.get_activities(ActivityFilter::default()).unwrap();
        let actions: Vec<ActivityAction> = trail.results.iter().map(|a| a.action).collect();
        assert_eq!(
            actions,
            vec![
                ActivityAction::Commented,
                ActivityAction::Assigned,
                ActivityAction::StatusChanged,
                ActivityAction::Created,
            ]
        );
        assert_eq!(trail.results[2].description, "Changed status from Open to Closed");
        assert!(trail.results.iter().all(|a| a.project == 1));
    }

    #[test]
    fn test_issue_stats() {
        let tracker = setup_logged_in();
        let project = tracker.create_project(new_project("Stats")).unwrap();
        tracker.create_issue(project.id, new_issue("a")).unwrap();
        let b = tracker.create_issue(project.id, new_issue("b")).unwrap();
        tracker
            .update_issue(b.id, IssueUpdate::default().status(IssueStatus::Closed))
            .unwrap();

        let stats = tracker.issue_stats(Some(project.id)).unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.count_status(IssueStatus::Open), 1);
        assert_eq!(stats.count_status(IssueStatus::Closed), 1);
        assert_eq!(stats.count_status(IssueStatus::InProgress), 0);
        assert_eq!(stats.count_priority(Priority::Medium), 2);

        let everything = tracker.issue_stats(None).unwrap();
        assert_eq!(everything.total, 4);
    }

    // ==================== Backup ====================

    #[test]
    fn test_snapshot_restore_into_fresh_tracker() {
        let source = setup_logged_in();
        let project = source.create_project(new_project("Backed up")).unwrap();
        let issue = source.create_issue(project.id, new_issue("Saved")).unwrap();
        source.create_comment(issue.id, "note").unwrap();
        let snapshot = source.export_snapshot().unwrap();

        let target = Tracker::in_memory();
        target.restore_snapshot(snapshot).unwrap();

        assert_eq!(target.get_project(project.id).unwrap().issues_count, 1);
        assert_eq!(target.get_comments(issue.id).unwrap().len(), 1);
        assert!(!target.get_activities(ActivityFilter::default()).unwrap().is_empty());
        assert!(!target.is_authenticated().unwrap());
    }

    #[test]
    fn test_restore_rejects_newer_snapshot() {
        let tracker = Tracker::in_memory();
        let mut snapshot = tracker.export_snapshot().unwrap();
        snapshot.version = SNAPSHOT_VERSION + 1;
        assert!(tracker.restore_snapshot(snapshot).is_err());
    }

    // ==================== Storage and latency ====================

    #[test]
    fn test_state_persists_across_sqlite_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.db");
        let project_id = {
            let tracker = Tracker::new(Box::new(Database::open(&path).unwrap()), Box::new(NoLatency));
            tracker.login("admin", "x").unwrap();
            tracker.create_project(new_project("Durable")).unwrap().id
        };

        let tracker = Tracker::new(Box::new(Database::open(&path).unwrap()), Box::new(NoLatency));
        assert_eq!(tracker.current_user().unwrap().unwrap().username, "admin");
        assert_eq!(tracker.get_project(project_id).unwrap().name, "Durable");
    }

    #[test]
    fn test_malformed_collection_surfaces_error() {
        let tracker = Tracker::in_memory();
        tracker.store().set(keys::PROJECTS, "not json").unwrap();
        let err = tracker.get_project(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_update_with_corrupt_session_still_succeeds() {
        let tracker = Tracker::in_memory();
        tracker.get_projects().unwrap();
        tracker.store().set(keys::CURRENT_USER, "garbage").unwrap();

        let updated = tracker
            .update_issue(1, IssueUpdate::default().status(IssueStatus::Closed))
            .unwrap();
        assert_eq!(updated.status, IssueStatus::Closed);
        assert_eq!(tracker.get_issue(1).unwrap().issue.status, IssueStatus::Closed);
    }

    #[test]
    fn test_corrupt_activity_log_does_not_fail_writes() {
        let tracker = setup_logged_in();
        tracker.store().set(keys::ACTIVITIES, "not json").unwrap();

        let issue = tracker.create_issue(1, new_issue("Still saved")).unwrap();
        tracker
            .update_issue(issue.id, IssueUpdate::default().status(IssueStatus::Closed))
            .unwrap();
        tracker.create_comment(issue.id, "noted").unwrap();

        let stored = tracker.get_issue(issue.id).unwrap();
        assert_eq!(stored.issue.status, IssueStatus::Closed);
        assert_eq!(stored.issue.comments_count, 1);
        assert!(tracker.get_activities(ActivityFilter::default()).is_err());
    }

    #[test]
    fn test_every_store_operation_pauses_once() {
        let counter = Arc::new(AtomicUsize::new(0));
        let tracker = Tracker::new(
            Box::new(MemoryStore::new()),
            Box::new(CountingLatency(Arc::clone(&counter))),
        );

        tracker.login("demo", "").unwrap();
        tracker.get_projects().unwrap();
        tracker.get_issue(1).unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);

        // Session queries are local
        tracker.current_user().unwrap();
        tracker.is_authenticated().unwrap();
        tracker.logout().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    proptest! {
        #[test]
        fn prop_issue_count_matches_created(count in 0usize..8) {
            let tracker = setup_logged_in();
            let project = tracker.create_project(new_project("Prop")).unwrap();
            for i in 0..count {
                tracker.create_issue(project.id, new_issue(&format!("#{}", i))).unwrap();
            }
            prop_assert_eq!(tracker.get_project(project.id).unwrap().issues_count, count);
        }

        #[test]
        fn prop_search_never_panics(query in "\\PC{0,20}") {
            let tracker = setup_logged_in();
            let filters = IssueFilters { search: Some(query), ..Default::default() };
            prop_assert!(tracker.get_issues(seed::DEMO_PROJECT_ID, &filters).is_ok());
        }

        #[test]
        fn prop_unicode_comment_roundtrip(content in "[\\p{L}\\p{N} ]{1,100}") {
            let tracker = setup_logged_in();
            tracker.create_comment(1, &content).unwrap();
            let detail = tracker.get_issue(1).unwrap();
            prop_assert_eq!(&detail.comments[0].content, &content);
        }
    }
}
