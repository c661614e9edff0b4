//! # studyhall-store
//!
//! Local persistence for the Studyhall application, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model: users, friend edges, groups, and messages.  Multi-step mutations
//! (friend edges, group creation, backup import) run inside SQL
//! transactions, so a failed write never leaves a half-applied change
//! behind.

pub mod backup;
pub mod database;
pub mod friends;
pub mod groups;
pub mod messages;
pub mod migrations;
pub mod models;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
