pub mod activity;
pub mod auth;
pub mod comment;
pub mod create;
pub mod export;
pub mod init;
pub mod list;
pub mod project;
pub mod show;
pub mod stats;
pub mod update;
pub mod users;
