//! Compiles a [`FilterRequest`] into one parameterized SELECT.
//!
//! Every user supplied value travels as a bound parameter. The only
//! identifiers spliced into SQL text are the configured table name, the
//! fixed listing columns and amenity columns taken from the vocabulary, all
//! of which are validated identifiers.

use std::fmt;
use std::sync::Arc;

use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::query::Query;
use tracing::debug;

use super::amenities::{AmenitySchema, AmenityVocabulary};
use super::types::{DistanceFilter, FilterRequest, RentFilter};

/// Listing columns shared by both amenity layouts. Numeric columns are cast
/// so tables declaring them INTEGER decode the same way as REAL ones.
const BASE_COLUMNS: &[&str] = &[
    "id",
    "name",
    "accommodation_type",
    "CAST(distance AS REAL) AS distance",
    "gender",
    "room_type",
    "CAST(rent AS REAL) AS rent",
];

/// A value bound to a query parameter
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Real(f64),
}

impl SqlValue {
    pub fn bind_to<'q>(
        &'q self,
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match self {
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Real(f) => query.bind(*f),
        }
    }
}

/// A named parameter. Names label parameters in logs and tests; binding is
/// positional in predicate order.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    pub name: String,
    pub value: SqlValue,
}

impl BoundParam {
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// One conjunct of the WHERE clause, with `?` placeholders for `params`
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub clause: String,
    pub params: Vec<BoundParam>,
}

impl Predicate {
    fn single(clause: impl Into<String>, name: &str, value: SqlValue) -> Self {
        Self {
            clause: clause.into(),
            params: vec![BoundParam::new(name, value)],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub predicates: Vec<Predicate>,
}

impl CompiledQuery {
    /// Parameters in binding order
    pub fn params(&self) -> impl Iterator<Item = &BoundParam> {
        self.predicates.iter().flat_map(|p| p.params.iter())
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.params().map(|p| p.name.as_str()).collect()
    }

    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Id,
    Name,
    Distance,
    Rent,
}

impl SortKey {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "distance" => Some(Self::Distance),
            "rent" => Some(Self::Rent),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Distance => "distance",
            Self::Rent => "rent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortOrder {
    /// `rent`, `rent:asc` or `rent:desc`
    pub fn parse(value: &str) -> Option<Self> {
        let (key, direction) = match value.split_once(':') {
            Some((key, dir)) => {
                let direction = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    _ => return None,
                };
                (key, direction)
            }
            None => (value, SortDirection::Asc),
        };
        Some(Self {
            key: SortKey::parse(key)?,
            direction,
        })
    }

    fn to_sql(self) -> String {
        let direction = match self.direction {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        };
        format!("{} {direction}, id ASC", self.key.column())
    }
}

/// Immutable query compiler built from configuration at startup
#[derive(Clone)]
pub struct QueryCompiler {
    table: String,
    schema: Arc<dyn AmenitySchema>,
    vocabulary: AmenityVocabulary,
    sort: Option<SortOrder>,
}

impl fmt::Debug for QueryCompiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCompiler")
            .field("table", &self.table)
            .field("schema", &self.schema.name())
            .field("sort", &self.sort)
            .finish()
    }
}

impl QueryCompiler {
    /// `table` must already be a validated identifier
    pub fn new(
        table: impl Into<String>,
        schema: Arc<dyn AmenitySchema>,
        vocabulary: AmenityVocabulary,
    ) -> Self {
        Self {
            table: table.into(),
            schema,
            vocabulary,
            sort: None,
        }
    }

    pub fn with_sort(mut self, sort: Option<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn schema(&self) -> &dyn AmenitySchema {
        self.schema.as_ref()
    }

    pub fn vocabulary(&self) -> &AmenityVocabulary {
        &self.vocabulary
    }

    fn select_clause(&self) -> String {
        let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| c.to_string()).collect();
        columns.extend(self.schema.columns(&self.vocabulary));
        format!("SELECT {} FROM {}", columns.join(", "), self.table)
    }

    /// Query for every listing matching `filter`
    pub fn compile(&self, filter: &FilterRequest) -> CompiledQuery {
        let predicates = self.predicates(filter);

        let mut sql = self.select_clause();
        push_where(&mut sql, &predicates);
        if let Some(sort) = self.sort {
            sql.push_str(" ORDER BY ");
            sql.push_str(&sort.to_sql());
        }

        CompiledQuery { sql, predicates }
    }

    /// Query for the single listing with `id`
    pub fn compile_by_id(&self, id: i64) -> CompiledQuery {
        let predicates = vec![Predicate::single("id = ?", "id", SqlValue::Int(id))];
        let mut sql = self.select_clause();
        push_where(&mut sql, &predicates);
        CompiledQuery { sql, predicates }
    }

    /// Conjuncts for `filter`, in a fixed field order
    pub fn predicates(&self, filter: &FilterRequest) -> Vec<Predicate> {
        let mut predicates = Vec::new();

        match filter.distance {
            DistanceFilter::Any => {}
            DistanceFilter::AtMost(km) => predicates.push(Predicate::single(
                "distance <= ?",
                "distance_max",
                SqlValue::Real(km),
            )),
            DistanceFilter::MoreThan(km) => predicates.push(Predicate::single(
                "distance > ?",
                "distance_min",
                SqlValue::Real(km),
            )),
        }

        if let Some(kind) = filter.accommodation_type {
            predicates.push(Predicate::single(
                "LOWER(accommodation_type) = ?",
                "accommodation_type",
                SqlValue::Text(kind.as_str().to_string()),
            ));
        }

        if let Some(gender) = filter.gender {
            predicates.push(Predicate::single(
                "LOWER(gender) = ?",
                "gender",
                SqlValue::Text(gender.as_str().to_string()),
            ));
        }

        if let Some(room_type) = &filter.room_type {
            predicates.push(Predicate::single(
                "LOWER(room_type) = LOWER(?)",
                "room_type",
                SqlValue::Text(room_type.clone()),
            ));
        }

        if let Some(rent) = rent_predicate(&filter.rent) {
            predicates.push(rent);
        }

        for tag in &filter.amenities {
            match self.vocabulary.resolve(tag) {
                Some(amenity) => predicates.push(self.schema.has_amenity(amenity)),
                None => debug!(tag = %tag, "Ignoring unknown amenity tag"),
            }
        }

        predicates
    }
}

fn push_where(sql: &mut String, predicates: &[Predicate]) {
    if predicates.is_empty() {
        return;
    }
    let clauses: Vec<&str> = predicates.iter().map(|p| p.clause.as_str()).collect();
    sql.push_str(" WHERE ");
    sql.push_str(&clauses.join(" AND "));
}

fn rent_predicate(rent: &RentFilter) -> Option<Predicate> {
    match *rent {
        RentFilter::Any => None,
        RentFilter::AtMost(max) => Some(Predicate::single(
            "rent <= ?",
            "rent_max",
            SqlValue::Real(max),
        )),
        RentFilter::Band(band) => match band.bounds() {
            (None, None) => None,
            (Some(lower), None) => Some(Predicate::single(
                "rent >= ?",
                "rent_band_lower",
                SqlValue::Int(lower),
            )),
            (None, Some(upper)) => Some(Predicate::single(
                "rent < ?",
                "rent_band_upper",
                SqlValue::Int(upper),
            )),
            (Some(lower), Some(upper)) => Some(Predicate {
                clause: "(rent >= ? AND rent < ?)".to_string(),
                params: vec![
                    BoundParam::new("rent_band_lower", SqlValue::Int(lower)),
                    BoundParam::new("rent_band_upper", SqlValue::Int(upper)),
                ],
            }),
        },
        RentFilter::Range { min, max } => match (min, max) {
            (None, None) => None,
            (Some(min), None) => Some(Predicate::single(
                "rent >= ?",
                "rent_min",
                SqlValue::Real(min),
            )),
            (None, Some(max)) => Some(Predicate::single(
                "rent <= ?",
                "rent_max",
                SqlValue::Real(max),
            )),
            (Some(min), Some(max)) => Some(Predicate {
                clause: "(rent >= ? AND rent <= ?)".to_string(),
                params: vec![
                    BoundParam::new("rent_min", SqlValue::Real(min)),
                    BoundParam::new("rent_max", SqlValue::Real(max)),
                ],
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccommodationType, GenderPolicy};
    use crate::query::amenities::{DelimitedList, FlagColumns};
    use crate::query::types::RentBand;
    use pretty_assertions::assert_eq;

    fn flags() -> QueryCompiler {
        QueryCompiler::new(
            "accommodations",
            Arc::new(FlagColumns),
            AmenityVocabulary::new(["wifi", "ac"]).unwrap(),
        )
    }

    fn rent_clauses(predicates: &[Predicate]) -> usize {
        predicates
            .iter()
            .filter(|p| p.clause.contains("rent"))
            .count()
    }

    #[test]
    fn unconstrained_filter_selects_everything() {
        let query = flags().compile(&FilterRequest::default());
        assert!(query.is_unfiltered());
        assert_eq!(
            query.sql,
            "SELECT id, name, accommodation_type, CAST(distance AS REAL) AS distance, gender, \
             room_type, CAST(rent AS REAL) AS rent, wifi, ac FROM accommodations"
        );
    }

    #[test]
    fn conjoins_predicates_in_field_order() {
        let filter = FilterRequest {
            distance: DistanceFilter::AtMost(1.0),
            accommodation_type: Some(AccommodationType::Pg),
            gender: Some(GenderPolicy::Female),
            room_type: Some("Single".to_string()),
            rent: RentFilter::AtMost(9000.0),
            amenities: vec!["ac".to_string()],
        };
        let query = flags().compile(&filter);

        assert!(query.sql.ends_with(
            " WHERE distance <= ? AND LOWER(accommodation_type) = ? AND LOWER(gender) = ? \
             AND LOWER(room_type) = LOWER(?) AND rent <= ? AND ac = ?"
        ));
        assert_eq!(
            query.param_names(),
            vec![
                "distance_max",
                "accommodation_type",
                "gender",
                "room_type",
                "rent_max",
                "amenity_ac"
            ]
        );
    }

    #[test]
    fn user_values_never_reach_sql_text() {
        let filter = FilterRequest {
            room_type: Some("x' OR '1'='1".to_string()),
            amenities: vec!["wifi = 0 OR 1".to_string(), "wifi".to_string()],
            ..FilterRequest::default()
        };
        let query = flags().compile(&filter);
        assert!(!query.sql.contains("OR '1'"));
        assert!(!query.sql.contains("wifi = 0"));
        assert_eq!(query.param_names(), vec!["room_type", "amenity_wifi"]);
    }

    #[test]
    fn unknown_amenities_compile_to_nothing() {
        let filter = FilterRequest {
            amenities: vec!["jacuzzi".to_string(), "helipad".to_string()],
            ..FilterRequest::default()
        };
        assert!(flags().compile(&filter).is_unfiltered());
    }

    #[test]
    fn exactly_one_rent_predicate_per_filter() {
        let mut filters: Vec<RentFilter> =
            RentBand::ALL.into_iter().map(RentFilter::Band).collect();
        filters.push(RentFilter::AtMost(1.0));
        filters.push(RentFilter::Range {
            min: Some(1.0),
            max: Some(2.0),
        });
        filters.push(RentFilter::Range {
            min: None,
            max: Some(2.0),
        });

        for rent in filters {
            let filter = FilterRequest {
                rent,
                ..FilterRequest::default()
            };
            assert_eq!(rent_clauses(&flags().predicates(&filter)), 1, "{rent:?}");
        }
        assert_eq!(rent_clauses(&flags().predicates(&FilterRequest::default())), 0);
    }

    #[test]
    fn bands_are_half_open() {
        let band = rent_predicate(&RentFilter::Band(RentBand::From5kTo10k)).unwrap();
        assert_eq!(band.clause, "(rent >= ? AND rent < ?)");
        assert_eq!(band.params[0].value, SqlValue::Int(5_000));
        assert_eq!(band.params[1].value, SqlValue::Int(10_000));

        let first = rent_predicate(&RentFilter::Band(RentBand::Under5k)).unwrap();
        assert_eq!(first.clause, "rent < ?");
        let last = rent_predicate(&RentFilter::Band(RentBand::From20k)).unwrap();
        assert_eq!(last.clause, "rent >= ?");
    }

    #[test]
    fn more_than_distance_is_open_lower_bound() {
        let filter = FilterRequest {
            distance: DistanceFilter::MoreThan(2.0),
            ..FilterRequest::default()
        };
        let predicates = flags().predicates(&filter);
        assert_eq!(predicates[0].clause, "distance > ?");
        assert_eq!(predicates[0].params[0].value, SqlValue::Real(2.0));
    }

    #[test]
    fn delimited_layout_selects_single_column() {
        let compiler = QueryCompiler::new(
            "listings",
            Arc::new(DelimitedList::default()),
            AmenityVocabulary::default(),
        );
        let query = compiler.compile(&FilterRequest {
            amenities: vec!["wifi".to_string()],
            ..FilterRequest::default()
        });
        assert!(query.sql.contains("amenities FROM listings WHERE instr("));
        assert_eq!(query.params().count(), 3);
    }

    #[test]
    fn by_id_and_sorting() {
        let compiler = flags().with_sort(SortOrder::parse("rent:desc"));
        let by_id = compiler.compile_by_id(42);
        assert!(by_id.sql.ends_with(" WHERE id = ?"));
        assert!(!by_id.sql.contains("ORDER BY"));

        let all = compiler.compile(&FilterRequest::default());
        assert!(all.sql.ends_with(" ORDER BY rent DESC, id ASC"));
    }

    #[test]
    fn sort_order_parse() {
        assert_eq!(
            SortOrder::parse("distance"),
            Some(SortOrder {
                key: SortKey::Distance,
                direction: SortDirection::Asc
            })
        );
        assert_eq!(SortOrder::parse("rent:sideways"), None);
        assert_eq!(SortOrder::parse("amenities"), None);
    }
}
