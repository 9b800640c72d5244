//! Maps raw listing rows to [`AccommodationRecord`]s.

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::error::{ListingError, Result};
use crate::models::{AccommodationRecord, AccommodationType, GenderPolicy};

use super::amenities::{AmenitySchema, AmenityVocabulary};

/// Split a stored amenity string into tags, keeping stored order. Empty
/// segments (from `""`, doubled or trailing delimiters) are dropped.
pub fn split_amenities(raw: &str, delimiter: char) -> Vec<String> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn map_row(
    row: &SqliteRow,
    schema: &dyn AmenitySchema,
    vocabulary: &AmenityVocabulary,
) -> Result<AccommodationRecord> {
    let id: i64 = row.try_get("id")?;

    let kind: String = row.try_get("accommodation_type")?;
    let accommodation_type = AccommodationType::parse(&kind).ok_or_else(|| {
        ListingError::Mapping(format!("listing {id} has accommodation type {kind:?}"))
    })?;

    let gender: String = row.try_get("gender")?;
    let gender = GenderPolicy::parse(&gender).ok_or_else(|| {
        ListingError::Mapping(format!("listing {id} has gender policy {gender:?}"))
    })?;

    Ok(AccommodationRecord {
        id,
        name: row.try_get("name")?,
        accommodation_type,
        distance: row.try_get("distance")?,
        gender,
        room_type: row.try_get("room_type")?,
        rent: row.try_get("rent")?,
        amenities: schema.read_amenities(row, vocabulary)?,
    })
}

/// All rows or an error; never a partial result
pub fn map_rows(
    rows: &[SqliteRow],
    schema: &dyn AmenitySchema,
    vocabulary: &AmenityVocabulary,
) -> Result<Vec<AccommodationRecord>> {
    rows.iter()
        .map(|row| map_row(row, schema, vocabulary))
        .collect()
}

/// The single row of a lookup by id. Zero rows is `NotFound`.
pub fn map_single(
    id: i64,
    rows: &[SqliteRow],
    schema: &dyn AmenitySchema,
    vocabulary: &AmenityVocabulary,
) -> Result<AccommodationRecord> {
    match rows.first() {
        Some(row) => map_row(row, schema, vocabulary),
        None => Err(ListingError::NotFound(id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::amenities::{DelimitedList, FlagColumns};
    use sqlx::sqlite::SqlitePoolOptions;
    use sqlx::SqlitePool;

    #[test]
    fn splits_in_stored_order() {
        assert_eq!(split_amenities("wifi,ac", ','), vec!["wifi", "ac"]);
        assert_eq!(split_amenities("ac, wifi ,gym", ','), vec!["ac", "wifi", "gym"]);
    }

    #[test]
    fn empty_segments_are_dropped() {
        assert!(split_amenities("", ',').is_empty());
        assert!(split_amenities(" , ,", ',').is_empty());
        assert_eq!(split_amenities(",wifi,,ac,", ','), vec!["wifi", "ac"]);
        assert_eq!(split_amenities("wifi|ac", '|'), vec!["wifi", "ac"]);
    }

    async fn pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn maps_flag_columns_row() {
        let pool = pool().await;
        let vocabulary = AmenityVocabulary::new(["wifi", "ac", "gym"]).unwrap();
        let rows = sqlx::query(
            "SELECT 3 AS id, 'atmosphere' AS name, 'PG' AS accommodation_type, \
             1.5 AS distance, 'female' AS gender, 'double' AS room_type, 25000.0 AS rent, \
             1 AS wifi, 0 AS ac, 1 AS gym",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let record = map_single(3, &rows, &FlagColumns, &vocabulary).unwrap();
        assert_eq!(record.accommodation_type, AccommodationType::Pg);
        assert_eq!(record.gender, GenderPolicy::Female);
        assert_eq!(record.rent, 25000.0);
        assert_eq!(record.amenities, vec!["wifi", "gym"]);
    }

    #[tokio::test]
    async fn maps_delimited_row_and_null_list() {
        let pool = pool().await;
        let vocabulary = AmenityVocabulary::default();
        let rows = sqlx::query(
            "SELECT 1 AS id, 'a' AS name, 'flat' AS accommodation_type, 0.3 AS distance, \
             'any' AS gender, 'single' AS room_type, 24000.0 AS rent, 'gym,wifi,' AS amenities \
             UNION ALL \
             SELECT 2, 'b', 'hostel', 0.8, 'male', 'shared', 4200.0, NULL",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let records = map_rows(&rows, &DelimitedList::default(), &vocabulary).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].amenities, vec!["gym", "wifi"]);
        assert!(records[1].amenities.is_empty());
    }

    #[tokio::test]
    async fn unknown_enum_value_is_mapping_error() {
        let pool = pool().await;
        let rows = sqlx::query(
            "SELECT 1 AS id, 'a' AS name, 'castle' AS accommodation_type, 0.3 AS distance, \
             'any' AS gender, 'single' AS room_type, 1.0 AS rent, '' AS amenities",
        )
        .fetch_all(&pool)
        .await
        .unwrap();

        let err = map_rows(&rows, &DelimitedList::default(), &AmenityVocabulary::default())
            .unwrap_err();
        assert!(matches!(err, ListingError::Mapping(_)));
    }

    #[test]
    fn no_rows_is_not_found() {
        let err = map_single(99, &[], &FlagColumns, &AmenityVocabulary::default()).unwrap_err();
        assert!(matches!(err, ListingError::NotFound(99)));
    }
}
