use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A comic series, grouping the issues that live in one folder.
///
/// Identified by its unique folder path. Created lazily when the first
/// comic in that folder is catalogued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Absolute path of the folder holding the series. Unique across the catalog.
    pub folder_path: PathBuf,

    /// Series title, preferring embedded metadata over the folder name
    pub title: String,

    /// First publication year, kept as text; empty when unknown
    pub year: String,

    /// Volume marker, kept as text; empty when unknown
    pub volume: String,

    /// Tags parsed from the folder name, in original order
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Series {
    pub fn new(folder_path: PathBuf, title: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            folder_path,
            title,
            year: String::new(),
            volume: String::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
