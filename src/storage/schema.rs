//! Database schema definitions and version lifecycle
//!
//! The schema version is stamped into SQLite's `user_version` pragma. An
//! on-disk version older than [`SCHEMA_VERSION`] is handled by dropping the
//! table and recreating it: upgrades are destructive and lose every stored
//! row. There is no column-level migration path.

use rusqlite::Connection;
use tracing::{debug, warn};

/// Current schema version, stamped via `PRAGMA user_version`
pub const SCHEMA_VERSION: i32 = 1;

/// SQL to create the coordinates table
pub const CREATE_COORDINATES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS coordinates (
    id INTEGER PRIMARY KEY,
    latitude REAL,
    longitude REAL
)
"#;

/// Read the stamped schema version (0 for a fresh database)
pub fn schema_version(conn: &Connection) -> rusqlite::Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn table_exists(conn: &Connection) -> rusqlite::Result<bool> {
    conn.prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'coordinates'")
        .and_then(|mut stmt| stmt.exists([]))
}

fn create(conn: &Connection) -> rusqlite::Result<()> {
    debug!("Creating table: coordinates");
    conn.execute(CREATE_COORDINATES_TABLE, [])?;
    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

/// Bring the database up to [`SCHEMA_VERSION`].
///
/// A lower on-disk version (including the 0 of a pre-versioning file) drops
/// the table first. All rows are lost; there is no export step.
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    let version = schema_version(conn)?;
    if version >= SCHEMA_VERSION && table_exists(conn)? {
        return Ok(());
    }
    if version < SCHEMA_VERSION && table_exists(conn)? {
        warn!(
            from = version,
            to = SCHEMA_VERSION,
            "Upgrading database, this will drop tables and recreate"
        );
        conn.execute("DROP TABLE IF EXISTS coordinates", [])?;
    }
    create(conn)
}
