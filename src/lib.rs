//! # Visited - persistent store of approximate locations
//!
//! Visited keeps a durable log of approximate latitude/longitude samples
//! ("visited locations") and answers rectangular range queries over them.
//!
//! Visited provides:
//! - SQLite-backed storage with a versioned, self-creating schema
//! - Single and batch inserts through a cached prepared statement
//! - Full retrieval and inclusive bounding-box queries
//! - A [`LocationProvider`] trait as the seam for callers needing persistence
//!
//! Schema upgrades are destructive: opening a database stamped with an older
//! version drops the table and recreates it. There is no migration path and
//! no export step; bump the version only when losing the stored rows is
//! acceptable.

pub mod config;
pub mod location;
pub mod provider;
pub mod storage;

// Re-exports for convenient access
pub use location::ApproximateLocation;
pub use provider::LocationProvider;
pub use storage::{DATABASE_PROVIDER, VisitedStore};

/// Result type alias for Visited operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Visited operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to open database at {}: {source}", path.display())]
    Open {
        path: std::path::PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Write failed: {0}")]
    Write(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Read(#[source] rusqlite::Error),

    #[error("Batch insert aborted after {committed} committed rows: {source}")]
    BatchAborted {
        committed: usize,
        #[source]
        source: rusqlite::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
