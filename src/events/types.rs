// src/events/types.rs
//
// All domain events in the system.
// Each event represents an immutable fact that has already occurred.
//
// CRITICAL RULES:
// - Events are facts, not commands
// - Events are immutable
// - Events carry only the data needed to react
// - No business logic in event types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Trait that all domain events must implement
pub trait DomainEvent: std::fmt::Debug + Clone {
    /// Unique identifier for this event instance
    fn event_id(&self) -> Uuid;

    /// When this event occurred
    fn occurred_at(&self) -> DateTime<Utc>;

    /// Human-readable event type name
    fn event_type(&self) -> &'static str;
}

// ============================================================================
// WATCHER EVENTS
// ============================================================================

/// Emitted when a stabilized add/change is observed on a comic archive file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiscovered {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub file_path: PathBuf,
    pub library_id: Uuid,
    /// "created" or "modified"
    pub change: String,
}

impl FileDiscovered {
    pub fn new(file_path: PathBuf, library_id: Uuid, change: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            file_path,
            library_id,
            change,
        }
    }
}

impl DomainEvent for FileDiscovered {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "FileDiscovered"
    }
}

/// Emitted when a watched file disappears. The catalog record is retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRemoved {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub file_path: PathBuf,
    pub library_id: Uuid,
}

impl FileRemoved {
    pub fn new(file_path: PathBuf, library_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            file_path,
            library_id,
        }
    }
}

impl DomainEvent for FileRemoved {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "FileRemoved"
    }
}

/// Emitted when a library path starts being watched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryWatchStarted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub library_id: Uuid,
    pub path: PathBuf,
}

impl LibraryWatchStarted {
    pub fn new(library_id: Uuid, path: PathBuf) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            library_id,
            path,
        }
    }
}

impl DomainEvent for LibraryWatchStarted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "LibraryWatchStarted"
    }
}

/// Emitted when a library path stops being watched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryWatchStopped {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub library_id: Uuid,
    pub path: PathBuf,
}

impl LibraryWatchStopped {
    pub fn new(library_id: Uuid, path: PathBuf) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            library_id,
            path,
        }
    }
}

impl DomainEvent for LibraryWatchStopped {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "LibraryWatchStopped"
    }
}

/// Emitted when a full walk of a library root completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryScanned {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub library_id: Uuid,
    pub path: PathBuf,
    pub files_enqueued: usize,
}

impl LibraryScanned {
    pub fn new(library_id: Uuid, path: PathBuf, files_enqueued: usize) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            library_id,
            path,
            files_enqueued,
        }
    }
}

impl DomainEvent for LibraryScanned {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "LibraryScanned"
    }
}

// ============================================================================
// CATALOG EVENTS
// ============================================================================

/// Emitted when a comic record is inserted or updated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicUpserted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub comic_id: Uuid,
    pub file_path: PathBuf,
    pub series_title: String,
    pub issue_number: String,
    /// true on first insert, false on update
    pub created: bool,
}

impl ComicUpserted {
    pub fn new(
        comic_id: Uuid,
        file_path: PathBuf,
        series_title: String,
        issue_number: String,
        created: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            comic_id,
            file_path,
            series_title,
            issue_number,
            created,
        }
    }
}

impl DomainEvent for ComicUpserted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "ComicUpserted"
    }
}

/// Emitted when reprocessing short-circuits on an unchanged content hash
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicUnchanged {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub comic_id: Uuid,
    pub file_path: PathBuf,
}

impl ComicUnchanged {
    pub fn new(comic_id: Uuid, file_path: PathBuf) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            comic_id,
            file_path,
        }
    }
}

impl DomainEvent for ComicUnchanged {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "ComicUnchanged"
    }
}

/// Emitted when a new series record is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesCreated {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub series_id: Uuid,
    pub folder_path: PathBuf,
    pub title: String,
}

impl SeriesCreated {
    pub fn new(series_id: Uuid, folder_path: PathBuf, title: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            series_id,
            folder_path,
            title,
        }
    }
}

impl DomainEvent for SeriesCreated {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "SeriesCreated"
    }
}

/// Emitted when a comic is associated with its series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComicLinkedToSeries {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub comic_id: Uuid,
    pub series_id: Uuid,
}

impl ComicLinkedToSeries {
    pub fn new(comic_id: Uuid, series_id: Uuid) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            comic_id,
            series_id,
        }
    }
}

impl DomainEvent for ComicLinkedToSeries {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "ComicLinkedToSeries"
    }
}

// ============================================================================
// JOB EVENTS
// ============================================================================

/// Emitted when a job is placed on the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEnqueued {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub kind: String,
}

impl JobEnqueued {
    pub fn new(job_id: Uuid, kind: String) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            job_id,
            kind,
        }
    }
}

impl DomainEvent for JobEnqueued {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "JobEnqueued"
    }
}

/// Emitted when a job attempt completes successfully
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompleted {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub kind: String,
    pub duration_ms: u64,
}

impl JobCompleted {
    pub fn new(job_id: Uuid, kind: String, duration_ms: u64) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            job_id,
            kind,
            duration_ms,
        }
    }
}

impl DomainEvent for JobCompleted {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "JobCompleted"
    }
}

/// Emitted when a job attempt fails.
///
/// `dead_lettered` is true once the retry ceiling is exhausted and the job
/// will not run again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailed {
    pub event_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub job_id: Uuid,
    pub kind: String,
    pub attempts: u32,
    pub error: String,
    pub dead_lettered: bool,
}

impl JobFailed {
    pub fn new(job_id: Uuid, kind: String, attempts: u32, error: String, dead_lettered: bool) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            job_id,
            kind,
            attempts,
            error,
            dead_lettered,
        }
    }
}

impl DomainEvent for JobFailed {
    fn event_id(&self) -> Uuid {
        self.event_id
    }
    fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }
    fn event_type(&self) -> &'static str {
        "JobFailed"
    }
}
