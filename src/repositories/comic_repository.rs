// src/repositories/comic_repository.rs
//
// Comic Repository
//
// Maps Comic entities to the comics table. The unique index on file_path
// is the idempotency backbone: at most one record per file path.

use crate::db::ConnectionPool;
use crate::domain::comic::Comic;
use crate::error::{AppError, AppResult};
use crate::repositories::{parse_string_list, parse_timestamp, parse_uuid};
use rusqlite::Row;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait ComicRepository: Send + Sync {
    /// Insert or update the record for `comic.id`, returning the id.
    ///
    /// A concurrent insert of the same file path under a different id
    /// violates the unique index and surfaces as a database error; the
    /// caller's retry observes the winning row on the next attempt.
    fn upsert(&self, comic: &Comic) -> AppResult<Uuid>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Comic>>;

    fn get_by_file_path(&self, path: &str) -> AppResult<Option<Comic>>;

    fn link_to_series(&self, comic_id: Uuid, series_id: Uuid) -> AppResult<bool>;

    fn list_by_series(&self, series_id: Uuid) -> AppResult<Vec<Comic>>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
pub struct SqliteComicRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteComicRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_comic(row: &Row) -> rusqlite::Result<Comic> {
        let id_str: String = row.get("id")?;
        let library_id_str: String = row.get("library_id")?;
        let series_id_str: Option<String> = row.get("series_id")?;
        let path_str: String = row.get("file_path")?;
        let tags_str: String = row.get("tags")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let series_id = match series_id_str {
            Some(s) => Some(parse_uuid("series_id", &s)?),
            None => None,
        };

        Ok(Comic {
            id: parse_uuid("id", &id_str)?,
            library_id: parse_uuid("library_id", &library_id_str)?,
            series_id,
            file_path: PathBuf::from(path_str),
            hash: row.get("hash")?,
            title: row.get("title")?,
            series_title: row.get("series_title")?,
            issue_number: row.get("issue_number")?,
            volume_number: row.get("volume_number")?,
            year: row.get("year")?,
            tags: parse_string_list("tags", &tags_str)?,
            page_count: row.get::<_, Option<i64>>("page_count")?.map(|n| n as u32),
            created_at: parse_timestamp("created_at", &created_at_str)?,
            updated_at: parse_timestamp("updated_at", &updated_at_str)?,
        })
    }
}

impl ComicRepository for SqliteComicRepository {
    fn upsert(&self, comic: &Comic) -> AppResult<Uuid> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO comics (
                id, library_id, series_id, file_path, hash,
                title, series_title, issue_number, volume_number, year,
                tags, page_count, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                library_id = excluded.library_id,
                series_id = excluded.series_id,
                file_path = excluded.file_path,
                hash = excluded.hash,
                title = excluded.title,
                series_title = excluded.series_title,
                issue_number = excluded.issue_number,
                volume_number = excluded.volume_number,
                year = excluded.year,
                tags = excluded.tags,
                page_count = excluded.page_count,
                updated_at = excluded.updated_at",
            rusqlite::params![
                comic.id.to_string(),
                comic.library_id.to_string(),
                comic.series_id.map(|id| id.to_string()),
                comic.file_path.to_string_lossy().to_string(),
                comic.hash,
                comic.title,
                comic.series_title,
                comic.issue_number,
                comic.volume_number,
                comic.year,
                serde_json::to_string(&comic.tags)?,
                comic.page_count.map(|n| n as i64),
                comic.created_at.to_rfc3339(),
                comic.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(comic.id)
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<Comic>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, library_id, series_id, file_path, hash,
                    title, series_title, issue_number, volume_number, year,
                    tags, page_count, created_at, updated_at
             FROM comics WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_comic);

        match result {
            Ok(comic) => Ok(Some(comic)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn get_by_file_path(&self, path: &str) -> AppResult<Option<Comic>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, library_id, series_id, file_path, hash,
                    title, series_title, issue_number, volume_number, year,
                    tags, page_count, created_at, updated_at
             FROM comics WHERE file_path = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![path], Self::row_to_comic);

        match result {
            Ok(comic) => Ok(Some(comic)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn link_to_series(&self, comic_id: Uuid, series_id: Uuid) -> AppResult<bool> {
        let conn = self.pool.get()?;
        let changed = conn.execute(
            "UPDATE comics SET series_id = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![
                series_id.to_string(),
                chrono::Utc::now().to_rfc3339(),
                comic_id.to_string()
            ],
        )?;
        Ok(changed > 0)
    }

    fn list_by_series(&self, series_id: Uuid) -> AppResult<Vec<Comic>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, library_id, series_id, file_path, hash,
                    title, series_title, issue_number, volume_number, year,
                    tags, page_count, created_at, updated_at
             FROM comics WHERE series_id = ?1 ORDER BY issue_number",
        )?;

        let comics = stmt
            .query_map(rusqlite::params![series_id.to_string()], Self::row_to_comic)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(comics)
    }
}
