// src/services/mod.rs
//
// Services Module - Orchestration Layer

pub mod hash_service;
pub mod ingest_service;
pub mod metadata_service;
pub mod name_parser;
pub mod scan_service;
pub mod series_service;
pub mod watch_service;

// Re-export all services and their types
pub use hash_service::HashService;

pub use name_parser::NameParser;

pub use metadata_service::MetadataStandardizer;

pub use ingest_service::{IngestOutcome, IngestService};

pub use scan_service::{ScanOutcome, ScanService};

pub use series_service::{SeriesOutcome, SeriesService};

pub use watch_service::{ChangeKind, LibraryWatcher, RawWatchEvent, WatcherConfig};
