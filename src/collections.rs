//! Typed, indexed views over the JSON collections in a [`KeyValueStore`].

use chrono::Utc;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::{Result, TrackerError};
use crate::models::{Activity, Comment, Issue, Project, User};
use crate::storage::KeyValueStore;

pub trait Record {
    fn id(&self) -> i64;
}

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Project {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Issue {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Comment {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Activity {
    fn id(&self) -> i64 {
        self.id
    }
}

/// A collection in insertion order with an id index.
///
/// When stored data holds duplicate ids, lookups resolve to the first row.
#[derive(Debug, Clone)]
pub struct Table<T> {
    rows: Vec<T>,
    index: HashMap<i64, usize>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> Table<T> {
    pub fn from_rows(rows: Vec<T>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (pos, row) in rows.iter().enumerate() {
            index.entry(row.id()).or_insert(pos);
        }
        Table { rows, index }
    }

    pub fn get(&self, id: i64) -> Option<&T> {
        self.index.get(&id).and_then(|&pos| self.rows.get(pos))
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        match self.index.get(&id) {
            Some(&pos) => self.rows.get_mut(pos),
            None => None,
        }
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn insert(&mut self, row: T) {
        self.index.entry(row.id()).or_insert(self.rows.len());
        self.rows.push(row);
    }

    /// Fresh id: current epoch millis plus jitter, redrawn until unused here.
    pub fn allocate_id(&self) -> i64 {
        allocate_id(|id| self.contains(id))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }
}

impl<T: Record + Serialize + DeserializeOwned> Table<T> {
    /// Load the collection stored under `key`. A missing key is an empty table.
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<Self> {
        let rows = match store.get(key)? {
            Some(raw) => serde_json::from_str::<Vec<T>>(&raw).map_err(|source| {
                TrackerError::Malformed {
                    key: key.to_string(),
                    source,
                }
            })?,
            None => Vec::new(),
        };
        Ok(Self::from_rows(rows))
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        let raw = serde_json::to_string(&self.rows)?;
        store.set(key, &raw)
    }
}

fn allocate_id(taken: impl Fn(i64) -> bool) -> i64 {
    let mut rng = rand::rng();
    loop {
        let id = Utc::now().timestamp_millis() + rng.random_range(0..1000);
        if !taken(id) {
            return id;
        }
    }
}

/// Users with secondary username and email indexes.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    table: Table<User>,
    by_username: HashMap<String, i64>,
    by_email: HashMap<String, i64>,
}

impl UserDirectory {
    pub fn load(store: &dyn KeyValueStore, key: &str) -> Result<Self> {
        Ok(Self::from_table(Table::load(store, key)?))
    }

    pub fn from_table(table: Table<User>) -> Self {
        let mut by_username = HashMap::with_capacity(table.len());
        let mut by_email = HashMap::with_capacity(table.len());
        for user in table.iter() {
            by_username.entry(user.username.clone()).or_insert(user.id);
            by_email.entry(user.email.clone()).or_insert(user.id);
        }
        UserDirectory {
            table,
            by_username,
            by_email,
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore, key: &str) -> Result<()> {
        self.table.save(store, key)
    }

    pub fn get(&self, id: i64) -> Option<&User> {
        self.table.get(id)
    }

    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        self.by_username
            .get(username)
            .and_then(|&id| self.table.get(id))
    }

    pub fn allocate_id(&self) -> i64 {
        self.table.allocate_id()
    }

    pub fn username_taken(&self, username: &str) -> bool {
        self.by_username.contains_key(username)
    }

    pub fn email_taken(&self, email: &str) -> bool {
        self.by_email.contains_key(email)
    }

    pub fn insert(&mut self, user: User) {
        self.by_username
            .entry(user.username.clone())
            .or_insert(user.id);
        self.by_email.entry(user.email.clone()).or_insert(user.id);
        self.table.insert(user);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, User> {
        self.table.iter()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn into_rows(self) -> Vec<User> {
        self.table.into_rows()
    }
}
