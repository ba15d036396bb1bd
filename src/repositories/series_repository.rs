// src/repositories/series_repository.rs
//
// Series Repository
//
// Maps Series entities to the series table. The unique index on
// folder_path guarantees exactly one series per distinct folder.

use crate::db::ConnectionPool;
use crate::domain::series::Series;
use crate::error::{AppError, AppResult};
use crate::repositories::{parse_string_list, parse_timestamp, parse_uuid};
use rusqlite::Row;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait SeriesRepository: Send + Sync {
    /// Insert or update the record for `series.id`, returning the id.
    fn upsert(&self, series: &Series) -> AppResult<Uuid>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Series>>;

    fn get_by_folder_path(&self, path: &str) -> AppResult<Option<Series>>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
pub struct SqliteSeriesRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteSeriesRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_series(row: &Row) -> rusqlite::Result<Series> {
        let id_str: String = row.get("id")?;
        let path_str: String = row.get("folder_path")?;
        let tags_str: String = row.get("tags")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        Ok(Series {
            id: parse_uuid("id", &id_str)?,
            folder_path: PathBuf::from(path_str),
            title: row.get("title")?,
            year: row.get("year")?,
            volume: row.get("volume")?,
            tags: parse_string_list("tags", &tags_str)?,
            created_at: parse_timestamp("created_at", &created_at_str)?,
            updated_at: parse_timestamp("updated_at", &updated_at_str)?,
        })
    }
}

impl SeriesRepository for SqliteSeriesRepository {
    fn upsert(&self, series: &Series) -> AppResult<Uuid> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO series (
                id, folder_path, title, year, volume, tags, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                folder_path = excluded.folder_path,
                title = excluded.title,
                year = excluded.year,
                volume = excluded.volume,
                tags = excluded.tags,
                updated_at = excluded.updated_at",
            rusqlite::params![
                series.id.to_string(),
                series.folder_path.to_string_lossy().to_string(),
                series.title,
                series.year,
                series.volume,
                serde_json::to_string(&series.tags)?,
                series.created_at.to_rfc3339(),
                series.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(series.id)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Series>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, folder_path, title, year, volume, tags, created_at, updated_at
             FROM series WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_series);

        match result {
            Ok(series) => Ok(Some(series)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn get_by_folder_path(&self, path: &str) -> AppResult<Option<Series>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, folder_path, title, year, volume, tags, created_at, updated_at
             FROM series WHERE folder_path = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![path], Self::row_to_series);

        match result {
            Ok(series) => Ok(Some(series)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}
