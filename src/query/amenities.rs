//! Amenity vocabulary and the two storage layouts for amenity tags.
//!
//! Listings store amenities either as one boolean column per tag or as a
//! single delimited string column. Both layouts implement [`AmenitySchema`],
//! so the compiler and the row mapper only ever ask "does this row carry
//! tag X" and "which tags does this row carry".

use std::fmt;
use std::sync::Arc;

use anyhow::{bail, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::compile::{BoundParam, Predicate, SqlValue};
use super::{is_identifier, is_sql_keyword, LISTING_COLUMNS};
use super::mapper::split_amenities;

/// Vocabulary used when none is configured
pub const DEFAULT_AMENITIES: &[&str] = &[
    "wifi",
    "ac",
    "kitchen",
    "laundry",
    "parking",
    "gym",
    "garden",
    "balcony",
    "cafeteria",
];

/// Column holding the delimited amenity list
pub const DELIMITED_COLUMN: &str = "amenities";

/// A known amenity. The tag doubles as the column name in the flag layout,
/// so it is restricted to a plain SQL identifier at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amenity {
    tag: String,
}

impl Amenity {
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Closed set of amenity tags. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmenityVocabulary {
    amenities: Vec<Amenity>,
}

impl AmenityVocabulary {
    pub fn new<I, S>(tags: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut amenities: Vec<Amenity> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim().to_ascii_lowercase();
            if tag.is_empty() {
                continue;
            }
            if !is_identifier(&tag) || is_sql_keyword(&tag) {
                bail!("amenity tag {tag:?} is not a usable column name");
            }
            if tag == DELIMITED_COLUMN || LISTING_COLUMNS.contains(&tag.as_str()) {
                bail!("amenity tag {tag:?} collides with a listing column");
            }
            if amenities.iter().all(|a| a.tag != tag) {
                amenities.push(Amenity { tag });
            }
        }
        if amenities.is_empty() {
            bail!("amenity vocabulary is empty");
        }
        Ok(Self { amenities })
    }

    /// Look up a requested tag. Unknown tags resolve to `None`.
    pub fn resolve(&self, tag: &str) -> Option<&Amenity> {
        let tag = tag.trim();
        self.amenities
            .iter()
            .find(|a| a.tag.eq_ignore_ascii_case(tag))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Amenity> {
        self.amenities.iter()
    }
}

impl Default for AmenityVocabulary {
    fn default() -> Self {
        Self {
            amenities: DEFAULT_AMENITIES
                .iter()
                .map(|tag| Amenity {
                    tag: tag.to_string(),
                })
                .collect(),
        }
    }
}

/// How amenity tags are laid out in the listing table
pub trait AmenitySchema: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Columns to select (and insert) for amenity data
    fn columns(&self, vocabulary: &AmenityVocabulary) -> Vec<String>;

    /// Column definitions used when creating a table in this layout
    fn column_definitions(&self, vocabulary: &AmenityVocabulary) -> Vec<String>;

    /// Predicate requiring a row to carry `amenity`
    fn has_amenity(&self, amenity: &Amenity) -> Predicate;

    /// Tags carried by a row
    fn read_amenities(
        &self,
        row: &SqliteRow,
        vocabulary: &AmenityVocabulary,
    ) -> Result<Vec<String>, sqlx::Error>;

    /// Values for [`columns`](Self::columns), in the same order
    fn encode_amenities(&self, tags: &[String], vocabulary: &AmenityVocabulary) -> Vec<SqlValue>;
}

/// One INTEGER 0/1 column per vocabulary tag
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagColumns;

impl AmenitySchema for FlagColumns {
    fn name(&self) -> &'static str {
        "flags"
    }

    fn columns(&self, vocabulary: &AmenityVocabulary) -> Vec<String> {
        vocabulary.iter().map(|a| a.tag.clone()).collect()
    }

    fn column_definitions(&self, vocabulary: &AmenityVocabulary) -> Vec<String> {
        vocabulary
            .iter()
            .map(|a| format!("{} INTEGER NOT NULL DEFAULT 0", a.tag))
            .collect()
    }

    fn has_amenity(&self, amenity: &Amenity) -> Predicate {
        Predicate {
            clause: format!("{} = ?", amenity.tag),
            params: vec![BoundParam::new(
                format!("amenity_{}", amenity.tag),
                SqlValue::Int(1),
            )],
        }
    }

    fn read_amenities(
        &self,
        row: &SqliteRow,
        vocabulary: &AmenityVocabulary,
    ) -> Result<Vec<String>, sqlx::Error> {
        let mut tags = Vec::new();
        for amenity in vocabulary.iter() {
            let flag: Option<i64> = row.try_get(amenity.tag.as_str())?;
            if flag.unwrap_or(0) != 0 {
                tags.push(amenity.tag.clone());
            }
        }
        Ok(tags)
    }

    fn encode_amenities(&self, tags: &[String], vocabulary: &AmenityVocabulary) -> Vec<SqlValue> {
        vocabulary
            .iter()
            .map(|a| {
                let present = tags.iter().any(|t| t.eq_ignore_ascii_case(&a.tag));
                SqlValue::Int(i64::from(present))
            })
            .collect()
    }
}

/// A single TEXT column of delimiter-separated tags, e.g. `wifi,ac`
#[derive(Debug, Clone, Copy)]
pub struct DelimitedList {
    delimiter: char,
}

impl DelimitedList {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimitedList {
    fn default() -> Self {
        Self::new(',')
    }
}

impl AmenitySchema for DelimitedList {
    fn name(&self) -> &'static str {
        "delimited"
    }

    fn columns(&self, _vocabulary: &AmenityVocabulary) -> Vec<String> {
        vec![DELIMITED_COLUMN.to_string()]
    }

    fn column_definitions(&self, _vocabulary: &AmenityVocabulary) -> Vec<String> {
        vec![format!("{DELIMITED_COLUMN} TEXT NOT NULL DEFAULT ''")]
    }

    // Wraps the stored list in delimiters so `wifi` never matches `wifi6`.
    fn has_amenity(&self, amenity: &Amenity) -> Predicate {
        let delimiter = self.delimiter.to_string();
        Predicate {
            clause: format!(
                "instr(? || LOWER(REPLACE({DELIMITED_COLUMN}, ' ', '')) || ?, ?) > 0"
            ),
            params: vec![
                BoundParam::new(
                    format!("amenity_{}_open", amenity.tag),
                    SqlValue::Text(delimiter.clone()),
                ),
                BoundParam::new(
                    format!("amenity_{}_close", amenity.tag),
                    SqlValue::Text(delimiter.clone()),
                ),
                BoundParam::new(
                    format!("amenity_{}", amenity.tag),
                    SqlValue::Text(format!("{delimiter}{}{delimiter}", amenity.tag)),
                ),
            ],
        }
    }

    fn read_amenities(
        &self,
        row: &SqliteRow,
        _vocabulary: &AmenityVocabulary,
    ) -> Result<Vec<String>, sqlx::Error> {
        let raw: Option<String> = row.try_get(DELIMITED_COLUMN)?;
        Ok(split_amenities(raw.as_deref().unwrap_or(""), self.delimiter))
    }

    fn encode_amenities(&self, tags: &[String], _vocabulary: &AmenityVocabulary) -> Vec<SqlValue> {
        vec![SqlValue::Text(tags.join(&self.delimiter.to_string()))]
    }
}

/// Configured amenity layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmenityLayout {
    Flags,
    Delimited,
}

impl AmenityLayout {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "flags" | "columns" => Some(Self::Flags),
            "delimited" | "string" => Some(Self::Delimited),
            _ => None,
        }
    }

    pub fn adapter(&self, delimiter: char) -> Arc<dyn AmenitySchema> {
        match self {
            Self::Flags => Arc::new(FlagColumns),
            Self::Delimited => Arc::new(DelimitedList::new(delimiter)),
        }
    }
}
