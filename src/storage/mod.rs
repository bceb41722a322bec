//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with a single table:
//! - coordinates(id, latitude, longitude)
//!
//! The schema carries a version stamp (`PRAGMA user_version`). Opening a
//! database stamped with an older version drops the table and recreates it;
//! all rows are lost by design.

pub mod schema;
pub mod sqlite;

pub use sqlite::{DATABASE_PROVIDER, VisitedStore};
