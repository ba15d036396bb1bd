use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A configured library root directory.
///
/// Library configuration is owned by an external surface; the ingestion
/// pipeline consumes it read-only to know what to watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryRoot {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Absolute root path of the library
    pub path: PathBuf,

    /// Disabled libraries are not watched or scanned
    pub enabled: bool,

    /// Last time the library configuration or contents changed,
    /// as reported by the configuration surface
    pub last_changed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LibraryRoot {
    pub fn new(name: String, path: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            path,
            enabled: true,
            last_changed_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
