//! Filter normalization, predicate compilation and row mapping for
//! accommodation listings.

pub mod amenities;
pub mod compile;
pub mod mapper;
pub mod normalize;
pub mod types;

pub use amenities::{AmenityLayout, AmenityVocabulary};
pub use compile::{CompiledQuery, QueryCompiler, SortOrder, SqlValue};
pub use normalize::{normalize, RawParams};
pub use types::{FilterRequest, RentBand};

/// Columns every listing table carries, whatever its amenity layout
pub const LISTING_COLUMNS: &[&str] = &[
    "id",
    "name",
    "accommodation_type",
    "distance",
    "gender",
    "room_type",
    "rent",
];

/// SQLite keywords. None of them can name a table or column unquoted.
const SQLITE_KEYWORDS: &[&str] = &[
    "abort", "action", "add", "after", "all", "alter", "always", "analyze", "and", "as",
    "asc", "attach", "autoincrement", "before", "begin", "between", "by", "cascade", "case",
    "cast", "check", "collate", "column", "commit", "conflict", "constraint", "create",
    "cross", "current", "current_date", "current_time", "current_timestamp", "database",
    "default", "deferrable", "deferred", "delete", "desc", "detach", "distinct", "do", "drop",
    "each", "else", "end", "escape", "except", "exclude", "exclusive", "exists", "explain",
    "fail", "filter", "first", "following", "for", "foreign", "from", "full", "generated",
    "glob", "group", "groups", "having", "if", "ignore", "immediate", "in", "index",
    "indexed", "initially", "inner", "insert", "instead", "intersect", "into", "is",
    "isnull", "join", "key", "last", "left", "like", "limit", "match", "materialized",
    "natural", "no", "not", "nothing", "notnull", "null", "nulls", "of", "offset", "on",
    "or", "order", "others", "outer", "over", "partition", "plan", "pragma", "preceding",
    "primary", "query", "raise", "range", "recursive", "references", "regexp", "reindex",
    "release", "rename", "replace", "restrict", "returning", "right", "rollback", "row",
    "rows", "savepoint", "select", "set", "table", "temp", "temporary", "then", "ties", "to",
    "transaction", "trigger", "unbounded", "union", "unique", "update", "using", "vacuum",
    "values", "view", "virtual", "when", "where", "window", "with", "without",
];

pub fn is_sql_keyword(name: &str) -> bool {
    SQLITE_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(name))
}

/// True for plain SQL identifiers (`[A-Za-z_][A-Za-z0-9_]*`)
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
