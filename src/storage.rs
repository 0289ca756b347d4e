//! Key-value storage the tracker persists into.
//!
//! Every collection lives under one key as a JSON array; session state lives
//! under three more keys. Two backends exist: [`MemoryStore`] for tests and
//! throwaway sessions, and [`crate::db::Database`] on SQLite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::Result;

pub mod keys {
    pub const USERS: &str = "bug_tracker_users";
    pub const PROJECTS: &str = "bug_tracker_projects";
    pub const ISSUES: &str = "bug_tracker_issues";
    pub const COMMENTS: &str = "bug_tracker_comments";
    pub const ACTIVITIES: &str = "bug_tracker_activities";
    pub const CURRENT_USER: &str = "bug_tracker_current_user";
    pub const ACCESS_TOKEN: &str = "access_token";
    // Not namespaced, unlike the rest.
    pub const REFRESH_TOKEN: &str = "refresh_token";
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still a consistent map: every write is a single insert/remove.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
