// src/repositories/mod.rs
//
// Repository layer
//
// CRITICAL RULES:
// - Repositories are DUMB data mappers
// - NO business logic
// - NO invariant enforcement
// - NO event emission
// - NO cross-repository calls
// - Explicit SQL only

use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod comic_repository;
pub mod library_repository;
pub mod series_repository;

pub use comic_repository::{ComicRepository, SqliteComicRepository};
pub use library_repository::{LibraryRepository, SqliteLibraryRepository};
pub use series_repository::{SeriesRepository, SqliteSeriesRepository};

// ---------------------------------------------------------------------
// Shared row conversion helpers
//
// All parse failures are explicit errors, never silent defaults.
// ---------------------------------------------------------------------

pub(crate) fn conversion_error(column: &str, value: &str, detail: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("Invalid {} '{}': {}", column, value, detail),
        )),
    )
}

pub(crate) fn parse_uuid(column: &str, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| conversion_error(column, value, &e.to_string()))
}

pub(crate) fn parse_timestamp(column: &str, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(column, value, &e.to_string()))
}

pub(crate) fn parse_string_list(column: &str, value: &str) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(value).map_err(|e| conversion_error(column, value, &e.to_string()))
}
