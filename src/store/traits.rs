use crate::error::Result;
use crate::models::AccommodationRecord;
use crate::query::FilterRequest;
use async_trait::async_trait;

/// Common trait for anything that can answer listing queries.
/// Handlers only see this, so the backing store can be swapped in tests.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Every listing matching `filter`, in unspecified order unless a sort is configured
    async fn search(&self, filter: &FilterRequest) -> Result<Vec<AccommodationRecord>>;

    /// One listing by id, `NotFound` when absent
    async fn find(&self, id: i64) -> Result<AccommodationRecord>;

    /// Cheap round trip to the store
    async fn ping(&self) -> Result<()>;

    /// Get the name of the backing store
    fn source_name(&self) -> &'static str;
}
