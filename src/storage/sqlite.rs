//! SQLite storage implementation

use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

use rusqlite::{Connection, params};
use tracing::{debug, trace};

use super::schema;
use crate::location::ApproximateLocation;
use crate::provider::LocationProvider;
use crate::{Error, Result};

/// Provider tag stamped on every row read back from storage, regardless of
/// the tag the row was inserted with
pub const DATABASE_PROVIDER: &str = "Visited";

const INSERT: &str = "INSERT INTO coordinates (latitude, longitude) VALUES (?1, ?2)";

static INSTANCE: OnceLock<VisitedStore> = OnceLock::new();

/// SQLite-backed store of visited locations
///
/// The connection sits behind a mutex: writes serialize, and a reader never
/// observes a batch insert mid-flight.
pub struct VisitedStore {
    conn: Mutex<Connection>,
}

impl VisitedStore {
    /// Open a database file (creates file and schema if absent)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        schema::ensure_schema(&conn).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let memory = Path::new(":memory:");
        let conn = Connection::open_in_memory().map_err(|source| Error::Open {
            path: memory.to_path_buf(),
            source,
        })?;
        schema::ensure_schema(&conn).map_err(|source| Error::Open {
            path: memory.to_path_buf(),
            source,
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Process-wide singleton store.
    ///
    /// The first caller opens (and if needed creates) the database at
    /// `path`; every later caller gets the identical instance and `path` is
    /// ignored. The instance lives until process exit.
    pub fn instance(path: &Path) -> Result<&'static VisitedStore> {
        if let Some(store) = INSTANCE.get() {
            return Ok(store);
        }
        // Two threads may race here and both open; OnceLock publishes one
        // store and the loser's connection is dropped.
        let store = Self::open(path)?;
        Ok(INSTANCE.get_or_init(|| store))
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("connection mutex poisoned")
    }

    /// Insert a single location, returning the assigned row id.
    ///
    /// The insert statement is prepared once and cached on the connection,
    /// so repeated calls skip the SQL parse.
    pub fn insert(&self, location: &ApproximateLocation) -> Result<i64> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(INSERT).map_err(Error::Write)?;
        let id = stmt
            .insert(params![location.latitude, location.longitude])
            .map_err(Error::Write)?;
        debug!(
            id,
            latitude = location.latitude,
            longitude = location.longitude,
            "Inserted latitude and longitude"
        );
        Ok(id)
    }

    /// Insert many locations through one cached statement.
    ///
    /// Each row commits on its own (SQLite autocommit; there is no wrapping
    /// transaction). If a row fails, rows already written stay durable,
    /// the remaining rows are not attempted, and the error reports how many
    /// rows made it in. The statement handle is scope-dropped on every exit
    /// path.
    pub fn insert_batch(&self, locations: &[ApproximateLocation]) -> Result<usize> {
        let conn = self.conn();
        let mut stmt = conn.prepare_cached(INSERT).map_err(Error::Write)?;
        let mut committed = 0;
        for location in locations {
            stmt.execute(params![location.latitude, location.longitude])
                .map_err(|source| Error::BatchAborted { committed, source })?;
            committed += 1;
            debug!(
                latitude = location.latitude,
                longitude = location.longitude,
                "Batch inserted latitude and longitude"
            );
        }
        Ok(committed)
    }

    /// Delete every stored row. Irreversible.
    pub fn delete_all(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute("DELETE FROM coordinates", [])
            .map_err(Error::Write)?;
        Ok(())
    }

    /// All rows, longitude descending, re-tagged with [`DATABASE_PROVIDER`].
    ///
    /// An empty table yields an empty vec, not an error.
    pub fn select_all(&self) -> Result<Vec<ApproximateLocation>> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT latitude, longitude FROM coordinates ORDER BY longitude DESC")
            .map_err(Error::Read)?;
        let rows = stmt
            .query_map([], row_to_location)
            .map_err(Error::Read)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::Read)?;
        debug!(count = rows.len(), "Results obtained");
        Ok(rows)
    }

    /// Rows inside the box spanned by `upper_left` and `lower_right`,
    /// inclusive on all four edges, latitude descending.
    ///
    /// Corner convention follows a map viewport: `upper_left` holds the
    /// maximum latitude and minimum longitude, `lower_right` the minimum
    /// latitude and maximum longitude. Inverted corners are not reordered;
    /// they simply match nothing.
    pub fn select_visited(
        &self,
        upper_left: &ApproximateLocation,
        lower_right: &ApproximateLocation,
    ) -> Result<Vec<ApproximateLocation>> {
        let lon_min = upper_left.longitude;
        let lat_max = upper_left.latitude;
        let lon_max = lower_right.longitude;
        let lat_min = lower_right.latitude;
        trace!(lon_min, lon_max, lat_min, lat_max, "Select bounds");

        let conn = self.conn();
        let mut stmt = conn
            .prepare(
                "SELECT latitude, longitude FROM coordinates \
                 WHERE longitude >= ?1 AND longitude <= ?2 \
                   AND latitude >= ?3 AND latitude <= ?4 \
                 ORDER BY latitude DESC",
            )
            .map_err(Error::Read)?;
        let rows = stmt
            .query_map(params![lon_min, lon_max, lat_min, lat_max], row_to_location)
            .map_err(Error::Read)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::Read)?;
        for location in &rows {
            trace!(%location, "Added to list of results obtained");
        }
        debug!(count = rows.len(), "Results obtained");
        Ok(rows)
    }

    /// Count all stored rows
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM coordinates", [], |row| row.get(0))
            .map_err(Error::Read)?;
        Ok(count as usize)
    }
}

impl LocationProvider for VisitedStore {
    fn insert(&self, location: &ApproximateLocation) -> Result<i64> {
        VisitedStore::insert(self, location)
    }

    fn insert_batch(&self, locations: &[ApproximateLocation]) -> Result<usize> {
        VisitedStore::insert_batch(self, locations)
    }

    fn delete_all(&self) -> Result<()> {
        VisitedStore::delete_all(self)
    }

    fn select_all(&self) -> Result<Vec<ApproximateLocation>> {
        VisitedStore::select_all(self)
    }

    fn select_visited(
        &self,
        upper_left: &ApproximateLocation,
        lower_right: &ApproximateLocation,
    ) -> Result<Vec<ApproximateLocation>> {
        VisitedStore::select_visited(self, upper_left, lower_right)
    }
}

/// Helper to convert a row to a location with the fixed read-back tag
fn row_to_location(row: &rusqlite::Row) -> rusqlite::Result<ApproximateLocation> {
    Ok(ApproximateLocation::new(
        DATABASE_PROVIDER,
        row.get(0)?,
        row.get(1)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample(lat: f64, lon: f64) -> ApproximateLocation {
        ApproximateLocation::new("gps", lat, lon)
    }

    fn pairs(locations: &[ApproximateLocation]) -> Vec<(f64, f64)> {
        locations
            .iter()
            .map(|l| (l.latitude, l.longitude))
            .collect()
    }

    #[test]
    fn open_creates_file_and_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.db");

        let store = VisitedStore::open(&path).unwrap();

        assert!(path.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn instance_returns_the_same_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.db");

        let a = VisitedStore::instance(&path).unwrap();
        let b = VisitedStore::instance(&path).unwrap();

        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn insert_returns_increasing_row_ids() {
        let store = VisitedStore::open_in_memory().unwrap();

        let first = store.insert(&sample(1.0, 2.0)).unwrap();
        let second = store.insert(&sample(3.0, 4.0)).unwrap();
        let third = store.insert(&sample(5.0, 6.0)).unwrap();

        assert!(first < second);
        assert!(second < third);
    }

    #[test]
    fn select_all_on_empty_store_is_empty() {
        let store = VisitedStore::open_in_memory().unwrap();
        assert!(store.select_all().unwrap().is_empty());
    }

    #[test]
    fn select_all_orders_by_longitude_descending() {
        let store = VisitedStore::open_in_memory().unwrap();
        store.insert(&sample(1.0, 2.0)).unwrap();
        store.insert(&sample(3.0, 4.0)).unwrap();
        store.insert(&sample(1.0, 5.0)).unwrap();

        let all = store.select_all().unwrap();

        assert_eq!(pairs(&all), vec![(1.0, 5.0), (3.0, 4.0), (1.0, 2.0)]);
        assert!(all.iter().all(|l| l.provider == DATABASE_PROVIDER));
    }

    #[test]
    fn delete_all_leaves_nothing() {
        let store = VisitedStore::open_in_memory().unwrap();
        store.insert(&sample(1.0, 2.0)).unwrap();
        store.insert(&sample(3.0, 4.0)).unwrap();

        store.delete_all().unwrap();

        assert!(store.select_all().unwrap().is_empty());
    }

    #[test]
    fn bounding_box_filters_and_orders_by_latitude_descending() {
        let store = VisitedStore::open_in_memory().unwrap();
        for (lat, lon) in [(5.0, 5.0), (15.0, 5.0), (5.0, 15.0), (-1.0, -1.0)] {
            store.insert(&sample(lat, lon)).unwrap();
        }
        // exactly on the latitude edge
        store.insert(&sample(10.0, 5.0)).unwrap();

        let upper_left = sample(10.0, 0.0);
        let lower_right = sample(0.0, 10.0);
        let inside = store.select_visited(&upper_left, &lower_right).unwrap();

        assert_eq!(pairs(&inside), vec![(10.0, 5.0), (5.0, 5.0)]);
        assert!(inside.iter().all(|l| l.provider == DATABASE_PROVIDER));
    }

    #[test]
    fn bounding_box_includes_all_four_edges() {
        let store = VisitedStore::open_in_memory().unwrap();
        for (lat, lon) in [(10.0, 5.0), (0.0, 5.0), (5.0, 0.0), (5.0, 10.0)] {
            store.insert(&sample(lat, lon)).unwrap();
        }

        let inside = store
            .select_visited(&sample(10.0, 0.0), &sample(0.0, 10.0))
            .unwrap();

        assert_eq!(inside.len(), 4);
    }

    #[test]
    fn inverted_corners_match_nothing() {
        let store = VisitedStore::open_in_memory().unwrap();
        store.insert(&sample(5.0, 5.0)).unwrap();

        // corners swapped: derived bounds have min > max
        let inside = store
            .select_visited(&sample(0.0, 10.0), &sample(10.0, 0.0))
            .unwrap();

        assert!(inside.is_empty());
    }

    #[test]
    fn batch_insert_keeps_existing_rows() {
        let store = VisitedStore::open_in_memory().unwrap();
        store.insert(&sample(0.0, 0.0)).unwrap();

        let batch = [sample(1.0, 1.0), sample(2.0, 2.0), sample(3.0, 3.0)];
        let inserted = store.insert_batch(&batch).unwrap();

        assert_eq!(inserted, 3);
        let all = store.select_all().unwrap();
        assert_eq!(all.len(), 4);
        for wanted in &batch {
            assert!(
                all.iter()
                    .any(|l| l.latitude == wanted.latitude && l.longitude == wanted.longitude)
            );
        }
    }

    #[test]
    fn batch_rows_commit_without_a_wrapping_transaction() {
        // Each batch row is its own implicit transaction; an independent
        // connection sees them all once the batch returns, with nothing
        // left open to roll back.
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.db");
        let store = VisitedStore::open(&path).unwrap();

        store
            .insert_batch(&[sample(1.0, 1.0), sample(2.0, 2.0)])
            .unwrap();

        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM coordinates", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn read_back_is_bit_exact_and_retagged() {
        let store = VisitedStore::open_in_memory().unwrap();
        let lat = 51.507351_f64;
        let lon = -0.127758_f64;
        store
            .insert(&ApproximateLocation::new("network", lat, lon))
            .unwrap();

        let all = store.select_all().unwrap();

        assert_eq!(all.len(), 1);
        assert_eq!(all[0].latitude.to_bits(), lat.to_bits());
        assert_eq!(all[0].longitude.to_bits(), lon.to_bits());
        assert_eq!(all[0].provider, DATABASE_PROVIDER);
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.db");

        let store = VisitedStore::open(&path).unwrap();
        store.insert(&sample(1.0, 2.0)).unwrap();
        drop(store);

        let reopened = VisitedStore::open(&path).unwrap();
        assert_eq!(pairs(&reopened.select_all().unwrap()), vec![(1.0, 2.0)]);
    }

    #[test]
    fn reopening_an_older_version_drops_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("visited.db");
        {
            // write a pre-versioning database by hand: table present, rows
            // stored, user_version left at 0
            let conn = Connection::open(&path).unwrap();
            conn.execute(schema::CREATE_COORDINATES_TABLE, []).unwrap();
            conn.execute(
                "INSERT INTO coordinates (latitude, longitude) VALUES (1.0, 2.0)",
                [],
            )
            .unwrap();
        }

        let store = VisitedStore::open(&path).unwrap();

        assert!(store.select_all().unwrap().is_empty());
    }

    #[test]
    fn works_through_the_provider_trait() {
        let store = VisitedStore::open_in_memory().unwrap();
        let provider: &dyn LocationProvider = &store;

        provider.insert(&sample(1.0, 2.0)).unwrap();
        provider.insert_batch(&[sample(3.0, 4.0)]).unwrap();

        assert_eq!(provider.select_all().unwrap().len(), 2);
        provider.delete_all().unwrap();
        assert!(provider.select_all().unwrap().is_empty());
    }
}
