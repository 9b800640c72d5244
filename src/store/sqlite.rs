use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::AccommodationRecord;
use crate::query::mapper::{map_rows, map_single};
use crate::query::{CompiledQuery, FilterRequest, QueryCompiler};
use crate::store::traits::ListingSource;

/// Listing source over one SQLite table
pub struct SqlListingStore {
    pool: SqlitePool,
    compiler: QueryCompiler,
}

impl SqlListingStore {
    pub fn new(pool: SqlitePool, compiler: QueryCompiler) -> Self {
        Self { pool, compiler }
    }

    /// Run one read query on a connection held only for this call. The
    /// connection goes back to the pool when it drops, on every path.
    async fn fetch(&self, query: &CompiledQuery) -> Result<Vec<SqliteRow>> {
        let mut conn = self.pool.acquire().await?;

        debug!(sql = %query.sql, params = ?query.param_names(), "Executing listing query");

        let mut statement = sqlx::query(&query.sql);
        for param in query.params() {
            statement = param.value.bind_to(statement);
        }
        let rows = statement.fetch_all(&mut *conn).await?;
        Ok(rows)
    }
}

#[async_trait]
impl ListingSource for SqlListingStore {
    async fn search(&self, filter: &FilterRequest) -> Result<Vec<AccommodationRecord>> {
        let query = self.compiler.compile(filter);
        let rows = self.fetch(&query).await?;
        let records = map_rows(&rows, self.compiler.schema(), self.compiler.vocabulary())?;

        info!(
            filtered = !query.is_unfiltered(),
            predicates = query.predicates.len(),
            records = records.len(),
            "Listing search complete"
        );
        Ok(records)
    }

    async fn find(&self, id: i64) -> Result<AccommodationRecord> {
        let query = self.compiler.compile_by_id(id);
        let rows = self.fetch(&query).await?;
        map_single(id, &rows, self.compiler.schema(), self.compiler.vocabulary())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }

    fn source_name(&self) -> &'static str {
        "sqlite"
    }
}
