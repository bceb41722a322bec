//! The capability exposed to callers needing coordinate persistence

use crate::Result;
use crate::location::ApproximateLocation;

/// Durable CRUD plus bounding-box queries over location samples.
///
/// [`VisitedStore`](crate::VisitedStore) is the implementation; callers
/// depend on this trait so the storage engine stays swappable at the seam.
pub trait LocationProvider {
    /// Insert a single sample, returning its assigned row id
    fn insert(&self, location: &ApproximateLocation) -> Result<i64>;

    /// Insert many samples; each row commits independently
    fn insert_batch(&self, locations: &[ApproximateLocation]) -> Result<usize>;

    /// Remove every stored sample. Irreversible.
    fn delete_all(&self) -> Result<()>;

    /// Every stored sample, longitude descending
    fn select_all(&self) -> Result<Vec<ApproximateLocation>>;

    /// Samples inside the box spanned by `upper_left` and `lower_right`,
    /// latitude descending
    fn select_visited(
        &self,
        upper_left: &ApproximateLocation,
        lower_right: &ApproximateLocation,
    ) -> Result<Vec<ApproximateLocation>>;
}
