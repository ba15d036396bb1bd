// src/repositories/library_repository.rs
//
// Library Repository
//
// Library configuration is owned by an external surface. The ingestion
// pipeline reads it to know what to watch; `save` exists for that surface
// and for test setup, not for the pipeline.

use crate::db::ConnectionPool;
use crate::domain::library::LibraryRoot;
use crate::error::{AppError, AppResult};
use crate::repositories::{parse_timestamp, parse_uuid};
use chrono::{DateTime, Utc};
use rusqlite::Row;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

// ---------------------------------------------------------------------
// Repository contract
// ---------------------------------------------------------------------
pub trait LibraryRepository: Send + Sync {
    fn save(&self, library: &LibraryRoot) -> AppResult<()>;

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<LibraryRoot>>;

    /// Enabled library roots, the set the watcher reconciles against
    fn list_enabled(&self) -> AppResult<Vec<LibraryRoot>>;

    /// Last configuration/content change reported for a library
    fn get_last_changed(&self, id: Uuid) -> AppResult<Option<DateTime<Utc>>>;
}

// ---------------------------------------------------------------------
// SQLite Implementation
// ---------------------------------------------------------------------
pub struct SqliteLibraryRepository {
    pool: Arc<ConnectionPool>,
}

impl SqliteLibraryRepository {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    fn row_to_library(row: &Row) -> rusqlite::Result<LibraryRoot> {
        let id_str: String = row.get("id")?;
        let path_str: String = row.get("path")?;
        let last_changed_str: Option<String> = row.get("last_changed_at")?;
        let created_at_str: String = row.get("created_at")?;
        let updated_at_str: String = row.get("updated_at")?;

        let last_changed_at = match last_changed_str {
            Some(s) => Some(parse_timestamp("last_changed_at", &s)?),
            None => None,
        };

        Ok(LibraryRoot {
            id: parse_uuid("id", &id_str)?,
            name: row.get("name")?,
            path: PathBuf::from(path_str),
            enabled: row.get("enabled")?,
            last_changed_at,
            created_at: parse_timestamp("created_at", &created_at_str)?,
            updated_at: parse_timestamp("updated_at", &updated_at_str)?,
        })
    }
}

impl LibraryRepository for SqliteLibraryRepository {
    fn save(&self, library: &LibraryRoot) -> AppResult<()> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO libraries (
                id, name, path, enabled, last_changed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                path = excluded.path,
                enabled = excluded.enabled,
                last_changed_at = excluded.last_changed_at,
                updated_at = excluded.updated_at",
            rusqlite::params![
                library.id.to_string(),
                library.name,
                library.path.to_string_lossy().to_string(),
                library.enabled,
                library.last_changed_at.map(|t| t.to_rfc3339()),
                library.created_at.to_rfc3339(),
                library.updated_at.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    fn get_by_id(&self, id: Uuid) -> AppResult<Option<LibraryRoot>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, path, enabled, last_changed_at, created_at, updated_at
             FROM libraries WHERE id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![id.to_string()], Self::row_to_library);

        match result {
            Ok(library) => Ok(Some(library)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    fn list_enabled(&self) -> AppResult<Vec<LibraryRoot>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, path, enabled, last_changed_at, created_at, updated_at
             FROM libraries WHERE enabled = 1 ORDER BY name",
        )?;

        let libraries = stmt
            .query_map([], Self::row_to_library)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(libraries)
    }

    fn get_last_changed(&self, id: Uuid) -> AppResult<Option<DateTime<Utc>>> {
        Ok(self.get_by_id(id)?.and_then(|lib| lib.last_changed_at))
    }
}
