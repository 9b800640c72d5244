pub mod seed;
pub mod sqlite;
pub mod traits;

pub use seed::{sample_listings, seed_listings};
pub use sqlite::SqlListingStore;
pub use traits::ListingSource;

use anyhow::{Context, Result};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

pub fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:") || database_url.contains("mode=memory")
}

/// Connect a pool for `database_url`. An in-memory database lives only as
/// long as its connection, so it is pinned to a single connection that is
/// never recycled.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let options = if is_in_memory(database_url) {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new()
    };

    options
        .connect(database_url)
        .await
        .with_context(|| format!("Failed to connect to {database_url}"))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::{AccommodationRecord, AccommodationType, GenderPolicy};
    use crate::query::{AmenityLayout, AmenityVocabulary, QueryCompiler};

    pub async fn memory_pool() -> SqlitePool {
        connect("sqlite::memory:").await.unwrap()
    }

    pub fn compiler(layout: AmenityLayout) -> QueryCompiler {
        QueryCompiler::new(
            "accommodations",
            layout.adapter(','),
            AmenityVocabulary::default(),
        )
    }

    pub async fn memory_store(
        layout: AmenityLayout,
        records: &[AccommodationRecord],
    ) -> SqlListingStore {
        let pool = memory_pool().await;
        let compiler = compiler(layout);
        seed_listings(&pool, &compiler, records).await.unwrap();
        SqlListingStore::new(pool, compiler)
    }

    pub fn record(
        id: i64,
        accommodation_type: AccommodationType,
        rent: f64,
        distance: f64,
        amenities: &[&str],
    ) -> AccommodationRecord {
        AccommodationRecord {
            id,
            name: format!("listing {id}"),
            accommodation_type,
            distance,
            gender: GenderPolicy::Male,
            room_type: "shared".to_string(),
            rent,
            amenities: amenities.iter().map(|a| a.to_string()).collect(),
        }
    }
}
