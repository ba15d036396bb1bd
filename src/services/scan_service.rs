// src/services/scan_service.rs
//
// Full-library scan.
//
// The watcher only sees files that change while the process is running; a
// scan walks everything already on disk and queues it for ingestion. The
// directory fingerprint decides whether the walk happens at all: an
// unchanged tree is skipped before any per-file work. Queueing an
// already-catalogued file is harmless, the hash gate completes it as a
// no-op.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::domain::library::LibraryRoot;
use crate::error::{AppError, AppResult};
use crate::events::{EventBus, JobEnqueued, LibraryScanned};
use crate::queue::{JobPayload, JobQueue};
use crate::services::hash_service::HashService;
use crate::services::watch_service::{is_comic_file, is_hidden_within};

/// What a library scan did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The tree fingerprint matched the previous scan; nothing was walked
    Unchanged,

    Scanned { files_enqueued: usize },
}

pub struct ScanService {
    queue: Arc<dyn JobQueue>,
    hash_service: Arc<HashService>,
    event_bus: Arc<EventBus>,

    /// Fingerprint of each library tree at its last completed scan
    fingerprints: Mutex<HashMap<Uuid, String>>,
}

impl ScanService {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        hash_service: Arc<HashService>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            queue,
            hash_service,
            event_bus,
            fingerprints: Mutex::new(HashMap::new()),
        }
    }

    /// Scan one library root, enqueueing a NewComicFile job for every comic
    /// archive found under it.
    pub fn scan_library(&self, library: &LibraryRoot) -> AppResult<ScanOutcome> {
        if !library.path.is_dir() {
            return Err(AppError::FileNotFound {
                path: library.path.clone(),
            });
        }

        let fingerprint = self.hash_service.hash_directory(&library.path)?;
        {
            let fingerprints = self.fingerprints.lock().unwrap();
            if fingerprints.get(&library.id) == Some(&fingerprint) {
                log::debug!(
                    "library '{}' fingerprint unchanged, skipping walk",
                    library.name
                );
                return Ok(ScanOutcome::Unchanged);
            }
        }

        let mut files_enqueued = 0;
        for entry in WalkDir::new(&library.path)
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if is_hidden_within(&library.path, path) || !is_comic_file(path) {
                continue;
            }

            let job_id = self.queue.enqueue(JobPayload::NewComicFile {
                file_path: path.to_path_buf(),
                library_id: library.id,
            })?;
            self.event_bus
                .emit(JobEnqueued::new(job_id, "new_comic_file".to_string()));
            files_enqueued += 1;
        }

        self.fingerprints
            .lock()
            .unwrap()
            .insert(library.id, fingerprint);

        log::info!(
            "scanned library '{}', {} files queued for ingestion",
            library.name,
            files_enqueued
        );
        self.event_bus.emit(LibraryScanned::new(
            library.id,
            library.path.clone(),
            files_enqueued,
        ));

        Ok(ScanOutcome::Scanned { files_enqueued })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_at, initialize_database, ConnectionPool};
    use crate::queue::SqliteJobQueue;
    use std::fs;
    use std::path::{Path, PathBuf};

    struct Fixture {
        queue: Arc<dyn JobQueue>,
        service: ScanService,
        library: LibraryRoot,
        _root: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.keep();
        let pool: Arc<ConnectionPool> = Arc::new(create_pool_at(&root.join("test.db")).unwrap());
        initialize_database(&pool.get().unwrap()).unwrap();

        let library_dir = root.join("library");
        fs::create_dir_all(&library_dir).unwrap();

        let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(pool));
        let service = ScanService::new(
            queue.clone(),
            Arc::new(HashService::new()),
            Arc::new(EventBus::new()),
        );

        Fixture {
            queue,
            service,
            library: LibraryRoot::new("Comics".to_string(), library_dir),
            _root: root,
        }
    }

    fn write_file(base: &Path, relative: &str, contents: &[u8]) {
        let path = base.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_scan_enqueues_each_comic_file() {
        let fixture = fixture();
        let base = &fixture.library.path;
        write_file(base, "Batman (2011)/Batman 001 (2011).cbz", b"issue one");
        write_file(base, "Batman (2011)/Batman 002 (2011).cbz", b"issue two");
        write_file(base, "Batman (2011)/cover.jpg", b"pixels");
        write_file(base, ".staging/Batman 003 (2011).cbz", b"still copying");

        let outcome = fixture.service.scan_library(&fixture.library).unwrap();

        assert_eq!(outcome, ScanOutcome::Scanned { files_enqueued: 2 });
        assert_eq!(fixture.queue.pending_count().unwrap(), 2);
    }

    #[test]
    fn test_unchanged_tree_skips_rescan() {
        let fixture = fixture();
        write_file(
            &fixture.library.path,
            "Batman (2011)/Batman 001 (2011).cbz",
            b"issue one",
        );

        let first = fixture.service.scan_library(&fixture.library).unwrap();
        assert_eq!(first, ScanOutcome::Scanned { files_enqueued: 1 });

        // Same fingerprint: the second scan never walks, nothing new queued
        let second = fixture.service.scan_library(&fixture.library).unwrap();
        assert_eq!(second, ScanOutcome::Unchanged);
        assert_eq!(fixture.queue.pending_count().unwrap(), 1);
    }

    #[test]
    fn test_changed_tree_is_rescanned() {
        let fixture = fixture();
        write_file(
            &fixture.library.path,
            "Batman (2011)/Batman 001 (2011).cbz",
            b"issue one",
        );
        fixture.service.scan_library(&fixture.library).unwrap();

        write_file(
            &fixture.library.path,
            "Batman (2011)/Batman 002 (2011).cbz",
            b"issue two",
        );

        // Every comic file is requeued; the per-file hash gate makes the
        // redelivery of the unchanged one a no-op downstream
        let outcome = fixture.service.scan_library(&fixture.library).unwrap();
        assert_eq!(outcome, ScanOutcome::Scanned { files_enqueued: 2 });
        assert_eq!(fixture.queue.pending_count().unwrap(), 3);
    }

    #[test]
    fn test_missing_root_reports_distinct_error() {
        let fixture = fixture();
        let mut library = fixture.library.clone();
        library.path = library.path.join("absent");

        let result = fixture.service.scan_library(&library);
        assert!(matches!(result, Err(AppError::FileNotFound { .. })));
    }
}
