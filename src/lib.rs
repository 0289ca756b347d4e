//! A small bug tracker: users, projects, issues and comments kept as JSON
//! collections in a key-value store, behind the [`tracker::Tracker`] façade.

pub mod activity;
pub mod collections;
pub mod config;
pub mod db;
pub mod error;
pub mod latency;
pub mod logging;
pub mod models;
pub mod seed;
pub mod session;
pub mod storage;
pub mod tracker;

pub use error::{ErrorKind, Result, TrackerError};
pub use tracker::Tracker;
