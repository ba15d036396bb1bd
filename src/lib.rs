// src/lib.rs
// ComicHub - Local-first comic book library manager
//
// Architecture:
// - Domain-centric: entities and invariants live in domain modules
// - Event-driven: services emit domain events through a synchronous bus
// - Explicit: no implicit behavior, no magic; the composition root in
//   main.rs wires every dependency by hand
// - Queue-backed: the watcher only enqueues; workers do the heavy lifting
//   with at-least-once delivery and idempotent handlers

// ============================================================================
// FOUNDATION
// ============================================================================

pub mod db;
pub mod domain;
pub mod error;
pub mod events;
pub mod infrastructure;
pub mod queue;
pub mod repositories;
pub mod services;

// ============================================================================
// PUBLIC API - Domain Entities
// ============================================================================

pub use domain::{
    validate_comic,
    validate_series,
    // Comic
    Comic,
    ComicBookInfo,
    // Metadata
    ComicInfo,
    CreditEntry,
    // Library configuration
    LibraryRoot,
    MangaMode,
    PageInfo,
    // Parsed-name value objects
    ParsedFileProps,
    ParsedFolderProps,
    RawMetadata,
    // Series
    Series,
    StandardizedMetadata,
};

// ============================================================================
// PUBLIC API - Error Types
// ============================================================================

pub use error::{AppError, AppResult};

// ============================================================================
// PUBLIC API - Events
// ============================================================================

pub use events::{
    create_event_bus,
    ComicLinkedToSeries,
    ComicUnchanged,
    ComicUpserted,
    DomainEvent,
    EventBus,
    EventLogEntry,
    FileDiscovered,
    FileRemoved,
    JobCompleted,
    JobEnqueued,
    JobFailed,
    LibraryScanned,
    LibraryWatchStarted,
    LibraryWatchStopped,
    SeriesCreated,
};

// ============================================================================
// PUBLIC API - Database
// ============================================================================

pub use db::{create_connection_pool, create_pool_at, initialize_database, ConnectionPool};

// ============================================================================
// PUBLIC API - Repositories
// ============================================================================

pub use repositories::{
    ComicRepository,
    LibraryRepository,
    SeriesRepository,
    SqliteComicRepository,
    SqliteLibraryRepository,
    SqliteSeriesRepository,
};

// ============================================================================
// PUBLIC API - Queue
// ============================================================================

pub use queue::{
    BackoffStrategy,
    Job,
    JobKind,
    JobPayload,
    JobQueue,
    JobState,
    RetryPolicy,
    SqliteJobQueue,
    WorkerConfig,
    WorkerPool,
};

// ============================================================================
// PUBLIC API - Infrastructure
// ============================================================================

pub use infrastructure::{MetadataReader, ZipMetadataReader};

// ============================================================================
// PUBLIC API - Services
// ============================================================================

pub use services::{
    // Content hashing
    HashService,
    IngestOutcome,
    // NewComicFile pipeline
    IngestService,
    // Filesystem watcher
    LibraryWatcher,
    // Metadata standardization
    MetadataStandardizer,
    // Name parsing
    NameParser,
    ScanOutcome,
    // Full-library scan
    ScanService,
    SeriesOutcome,
    // ProcessComicSeries pipeline
    SeriesService,
    WatcherConfig,
};
