//! Application configuration loaded from environment variables

use std::env;

use anyhow::{bail, Context, Result};

use crate::query::{
    is_identifier, is_sql_keyword, AmenityLayout, AmenityVocabulary, QueryCompiler, SortOrder,
};
use crate::store::is_in_memory;

#[derive(Debug, Clone)]
pub struct Config {
    /// Interface to bind
    pub host: String,

    pub port: u16,

    /// SQLite connection string, e.g. `sqlite://listings.db` or `sqlite::memory:`
    pub database_url: String,

    /// Table holding one row per listing
    pub table: String,

    pub amenity_layout: AmenityLayout,

    /// Separator for the delimited amenity layout
    pub amenity_delimiter: char,

    pub vocabulary: AmenityVocabulary,

    /// Optional fixed result order; results are unordered without it
    pub sort: Option<SortOrder>,

    /// Create and fill the table with sample listings on startup
    pub seed_sample_data: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Every value is validated here so the rest
    /// of the service can treat configuration as trusted and immutable.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite::memory:".to_string());

        let table = lookup("LISTING_TABLE").unwrap_or_else(|| "accommodations".to_string());
        if !is_identifier(&table) || is_sql_keyword(&table) {
            bail!("LISTING_TABLE {table:?} is not a usable SQL table name");
        }

        let amenity_layout = match lookup("AMENITY_SCHEMA") {
            Some(value) => AmenityLayout::parse(&value).with_context(|| {
                format!("Invalid AMENITY_SCHEMA {value:?}, expected flags or delimited")
            })?,
            None => AmenityLayout::Delimited,
        };

        let amenity_delimiter = match lookup("AMENITY_DELIMITER") {
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if !c.is_whitespace() && !c.is_alphanumeric() => c,
                    _ => bail!(
                        "AMENITY_DELIMITER must be one punctuation character, got {value:?}"
                    ),
                }
            }
            None => ',',
        };

        let vocabulary = match lookup("AMENITIES") {
            Some(value) => AmenityVocabulary::new(value.split(',')).context("Invalid AMENITIES")?,
            None => AmenityVocabulary::default(),
        };

        let sort = lookup("LISTING_SORT")
            .filter(|v| !v.trim().is_empty())
            .map(|value| {
                SortOrder::parse(&value)
                    .with_context(|| format!("Invalid LISTING_SORT {value:?}"))
            })
            .transpose()?;

        let seed_sample_data = lookup("SEED_SAMPLE_DATA")
            .map(|v| v == "true" || v == "1")
            .unwrap_or_else(|| is_in_memory(&database_url));

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .parse()
                .context("Invalid PORT")?,
            database_url,
            table,
            amenity_layout,
            amenity_delimiter,
            vocabulary,
            sort,
            seed_sample_data,
        })
    }

    pub fn query_compiler(&self) -> QueryCompiler {
        QueryCompiler::new(
            self.table.clone(),
            self.amenity_layout.adapter(self.amenity_delimiter),
            self.vocabulary.clone(),
        )
        .with_sort(self.sort)
    }
}
