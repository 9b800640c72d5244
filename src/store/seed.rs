//! Creates and fills a listing table with sample data.
//!
//! Used for the in-memory demo mode and by tests. An existing table that
//! already holds rows is left untouched.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

use crate::models::{AccommodationRecord, AccommodationType, GenderPolicy};
use crate::query::{QueryCompiler, SqlValue, LISTING_COLUMNS};

pub async fn seed_listings(
    pool: &SqlitePool,
    compiler: &QueryCompiler,
    records: &[AccommodationRecord],
) -> Result<usize> {
    let schema = compiler.schema();
    let vocabulary = compiler.vocabulary();
    let table = compiler.table();

    let mut columns = vec![
        "id INTEGER PRIMARY KEY".to_string(),
        "name TEXT NOT NULL".to_string(),
        "accommodation_type TEXT NOT NULL".to_string(),
        "distance REAL NOT NULL".to_string(),
        "gender TEXT NOT NULL".to_string(),
        "room_type TEXT NOT NULL".to_string(),
        "rent REAL NOT NULL".to_string(),
    ];
    columns.extend(schema.column_definitions(vocabulary));

    let mut conn = pool.acquire().await.context("Failed to acquire connection")?;

    sqlx::query(&format!(
        "CREATE TABLE IF NOT EXISTS {table} ({})",
        columns.join(", ")
    ))
    .execute(&mut *conn)
    .await
    .with_context(|| format!("Failed to create table {table}"))?;

    let existing: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(&mut *conn)
        .await?;
    if existing > 0 {
        info!(table = %table, rows = existing, "Listing table already populated, skipping seed");
        return Ok(0);
    }

    let amenity_columns = schema.columns(vocabulary);
    let mut names = LISTING_COLUMNS.to_vec();
    names.extend(amenity_columns.iter().map(String::as_str));
    let placeholders = vec!["?"; names.len()].join(", ");
    let insert = format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        names.join(", ")
    );

    for record in records {
        let mut values = vec![
            SqlValue::Int(record.id),
            SqlValue::Text(record.name.clone()),
            SqlValue::Text(record.accommodation_type.as_str().to_string()),
            SqlValue::Real(record.distance),
            SqlValue::Text(record.gender.as_str().to_string()),
            SqlValue::Text(record.room_type.clone()),
            SqlValue::Real(record.rent),
        ];
        values.extend(schema.encode_amenities(&record.amenities, vocabulary));

        let mut statement = sqlx::query(&insert);
        for value in &values {
            statement = value.bind_to(statement);
        }
        statement
            .execute(&mut *conn)
            .await
            .with_context(|| format!("Failed to insert listing {}", record.id))?;
    }

    info!(
        table = %table,
        layout = schema.name(),
        rows = records.len(),
        "Seeded sample listings"
    );
    Ok(records.len())
}

#[allow(clippy::too_many_arguments)]
fn listing(
    id: i64,
    name: &str,
    accommodation_type: AccommodationType,
    distance: f64,
    gender: GenderPolicy,
    room_type: &str,
    rent: f64,
    amenities: &[&str],
) -> AccommodationRecord {
    AccommodationRecord {
        id,
        name: name.to_string(),
        accommodation_type,
        distance,
        gender,
        room_type: room_type.to_string(),
        rent,
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
    }
}

/// Listings served in demo mode
pub fn sample_listings() -> Vec<AccommodationRecord> {
    use AccommodationType::{Flat, Hostel, Pg};
    use GenderPolicy::{Any, Female, Male};

    vec![
        listing(
            1, "Khedekar Hostel", Hostel, 0.8, Male, "shared", 4200.0,
            &["wifi", "cafeteria"],
        ),
        listing(
            2, "Atmosphere", Pg, 1.5, Female, "double", 25000.0,
            &["wifi", "ac", "laundry"],
        ),
        listing(
            3, "Siddhi Residency", Flat, 0.3, Any, "2bhk", 24000.0,
            &["wifi", "parking", "balcony", "kitchen"],
        ),
        listing(
            4, "Campus View PG", Pg, 0.5, Male, "single", 8500.0,
            &["wifi", "laundry", "kitchen"],
        ),
        listing(
            5, "Greenfield Hostel", Hostel, 2.4, Female, "shared", 3800.0,
            &["garden", "cafeteria"],
        ),
        listing(
            6, "Lakeside Flats", Flat, 3.1, Any, "1bhk", 14500.0,
            &["ac", "gym", "parking"],
        ),
        listing(
            7, "Scholar's Nest", Pg, 0.9, Any, "single", 11000.0,
            &["wifi", "ac", "gym", "laundry"],
        ),
        listing(8, "Budget Dorms", Hostel, 0.1, Male, "dormitory", 2500.0, &["wifi"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::AmenityLayout;
    use crate::store::testing::{compiler, memory_pool};

    #[tokio::test]
    async fn seeds_once() {
        let pool = memory_pool().await;
        let compiler = compiler(AmenityLayout::Flags);

        let first = seed_listings(&pool, &compiler, &sample_listings()).await.unwrap();
        assert_eq!(first, sample_listings().len());

        let second = seed_listings(&pool, &compiler, &sample_listings()).await.unwrap();
        assert_eq!(second, 0);
    }

    #[test]
    fn sample_ids_are_unique() {
        let listings = sample_listings();
        let mut ids: Vec<i64> = listings.iter().map(|l| l.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), listings.len());
    }
}
