use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A catalogued comic book archive file.
///
/// Identified by its unique file path; the content hash gates reprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comic {
    /// Internal immutable identifier
    pub id: Uuid,

    /// Library this file was discovered in
    pub library_id: Uuid,

    /// Series this comic belongs to, once linked
    pub series_id: Option<Uuid>,

    /// Absolute path to the archive file. Unique across the catalog.
    pub file_path: PathBuf,

    /// SHA-256 digest of the file contents at last ingestion
    pub hash: String,

    /// Issue title (from embedded metadata when available)
    pub title: String,

    /// Series title this issue belongs to
    pub series_title: String,

    /// Issue number, kept as text ("1", "53", "Annual 1" style values survive)
    pub issue_number: String,

    /// Volume marker, kept as text
    pub volume_number: String,

    /// Publication year, kept as text; empty when unknown
    pub year: String,

    /// Release tags parsed from the file name, in original order
    pub tags: Vec<String>,

    /// Page count from embedded metadata
    pub page_count: Option<u32>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comic {
    /// Create a new Comic for a freshly discovered file
    pub fn new(library_id: Uuid, file_path: PathBuf, hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            library_id,
            series_id: None,
            file_path,
            hash,
            title: String::new(),
            series_title: String::new(),
            issue_number: String::new(),
            volume_number: String::new(),
            year: String::new(),
            tags: Vec::new(),
            page_count: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// True when the stored hash matches the digest just computed,
    /// meaning reprocessing would be a no-op.
    pub fn has_same_content(&self, digest: &str) -> bool {
        self.hash == digest
    }

    /// Replace the content hash after the file changed on disk
    pub fn set_hash(&mut self, hash: String) {
        self.hash = hash;
        self.updated_at = Utc::now();
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
