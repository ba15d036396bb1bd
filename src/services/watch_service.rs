// src/services/watch_service.rs
//
// Filesystem watcher for library roots.
//
// Per-library state machine: unwatched → watching → unwatched. The notify
// backend bridges raw events into a tokio channel; a debounce loop holds
// each path until a quiet period passes with no further writes, then
// enqueues a NewComicFile job (a stabilized event). A reconciliation loop
// keeps the watched set eventually consistent with library configuration
// without a restart.
//
// Removals are logged and surfaced as events only; catalog records are
// never deleted here.

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::events::{
    EventBus, FileDiscovered, FileRemoved, JobEnqueued, LibraryWatchStarted, LibraryWatchStopped,
};
use crate::queue::{JobPayload, JobQueue};
use crate::repositories::LibraryRepository;

const COMIC_EXTENSIONS: &[&str] = &["cbz", "cbr", "cb7", "cbt"];

/// Tunables for the watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Minimum quiet period with no further writes before an add/change
    /// is considered stable
    pub quiet_period: Duration,

    /// How often the pending map is swept for stabilized entries
    pub flush_interval: Duration,

    /// How often the watched set is reconciled against configuration
    pub reconcile_interval: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            quiet_period: Duration::from_secs(2),
            flush_interval: Duration::from_millis(500),
            reconcile_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A raw filesystem notification bridged out of the notify callback.
#[derive(Debug, Clone)]
pub struct RawWatchEvent {
    pub library_id: Uuid,
    pub library_root: PathBuf,
    pub kind: ChangeKind,
    pub path: PathBuf,
}

struct WatchedLibrary {
    path: PathBuf,
    /// Never read, but must stay alive: dropping the RecommendedWatcher
    /// deregisters the OS watch and stops event delivery.
    _watcher: RecommendedWatcher,
}

struct PendingEntry {
    library_id: Uuid,
    kind: ChangeKind,
    last_activity: Instant,
}

/// Watches enabled library roots and turns stabilized file activity into
/// NewComicFile jobs.
///
/// Explicitly constructed and owned by the composition root; lifecycle is
/// `start`/`stop`, not implicit on first access.
pub struct LibraryWatcher {
    library_repo: Arc<dyn LibraryRepository>,
    queue: Arc<dyn JobQueue>,
    event_bus: Arc<EventBus>,
    config: WatcherConfig,

    watched: Arc<Mutex<HashMap<Uuid, WatchedLibrary>>>,
    raw_tx: mpsc::UnboundedSender<RawWatchEvent>,
    raw_rx: std::sync::Mutex<Option<mpsc::UnboundedReceiver<RawWatchEvent>>>,
    shutdown_tx: watch::Sender<bool>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl LibraryWatcher {
    pub fn new(
        library_repo: Arc<dyn LibraryRepository>,
        queue: Arc<dyn JobQueue>,
        event_bus: Arc<EventBus>,
        config: WatcherConfig,
    ) -> Self {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            library_repo,
            queue,
            event_bus,
            config,
            watched: Arc::new(Mutex::new(HashMap::new())),
            raw_tx,
            raw_rx: std::sync::Mutex::new(Some(raw_rx)),
            shutdown_tx,
            handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Watch all enabled libraries and start the debounce and
    /// reconciliation loops. Call once.
    pub async fn start(&self) -> AppResult<()> {
        let raw_rx = self
            .raw_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| AppError::Watcher("watcher already started".to_string()))?;

        reconcile_once(
            &self.library_repo,
            &self.watched,
            &self.raw_tx,
            &self.event_bus,
        )
        .await;

        let mut handles = self.handles.lock().unwrap();

        handles.push(tokio::spawn(run_debounce_loop(
            raw_rx,
            Arc::clone(&self.queue),
            Arc::clone(&self.event_bus),
            self.config.clone(),
            self.shutdown_tx.subscribe(),
        )));

        let library_repo = Arc::clone(&self.library_repo);
        let watched = Arc::clone(&self.watched);
        let raw_tx = self.raw_tx.clone();
        let bus = Arc::clone(&self.event_bus);
        let interval = self.config.reconcile_interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        handles.push(tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {
                        reconcile_once(&library_repo, &watched, &raw_tx, &bus).await;
                    }
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        }));

        Ok(())
    }

    /// Stop watching everything and wait for the loops to exit.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap();
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.await;
        }

        let mut watched = self.watched.lock().await;
        for (library_id, entry) in watched.drain() {
            self.event_bus
                .emit(LibraryWatchStopped::new(library_id, entry.path));
        }

        log::info!("library watcher stopped");
    }

    /// Number of libraries currently watched.
    pub async fn watched_count(&self) -> usize {
        self.watched.lock().await.len()
    }
}

/// One reconciliation pass: watch newly enabled libraries, unwatch
/// disabled or deleted ones. One library failing never tears down the
/// others.
async fn reconcile_once(
    library_repo: &Arc<dyn LibraryRepository>,
    watched: &Arc<Mutex<HashMap<Uuid, WatchedLibrary>>>,
    raw_tx: &mpsc::UnboundedSender<RawWatchEvent>,
    bus: &Arc<EventBus>,
) {
    let enabled = match library_repo.list_enabled() {
        Ok(libraries) => libraries,
        Err(e) => {
            log::error!("could not list enabled libraries: {}", e);
            return;
        }
    };

    let mut watched = watched.lock().await;

    for library in &enabled {
        if watched.contains_key(&library.id) {
            continue;
        }

        match spawn_backend_watcher(library.id, &library.path, raw_tx.clone()) {
            Ok(watcher) => {
                log::info!(
                    "watching library '{}' at {}",
                    library.name,
                    library.path.display()
                );
                bus.emit(LibraryWatchStarted::new(library.id, library.path.clone()));
                watched.insert(
                    library.id,
                    WatchedLibrary {
                        path: library.path.clone(),
                        _watcher: watcher,
                    },
                );
            }
            Err(e) => {
                log::error!("failed to watch {}: {}", library.path.display(), e);
            }
        }
    }

    let enabled_ids: HashSet<Uuid> = enabled.iter().map(|library| library.id).collect();
    let stale: Vec<Uuid> = watched
        .keys()
        .filter(|id| !enabled_ids.contains(id))
        .copied()
        .collect();

    for library_id in stale {
        if let Some(entry) = watched.remove(&library_id) {
            log::info!("stopped watching {}", entry.path.display());
            bus.emit(LibraryWatchStopped::new(library_id, entry.path));
        }
    }
}

/// Create the notify backend watcher for one library root.
fn spawn_backend_watcher(
    library_id: Uuid,
    path: &Path,
    raw_tx: mpsc::UnboundedSender<RawWatchEvent>,
) -> notify::Result<RecommendedWatcher> {
    let library_root = path.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| match result {
            Ok(event) => {
                let kind = match event.kind {
                    EventKind::Create(_) => ChangeKind::Created,
                    EventKind::Modify(_) => ChangeKind::Modified,
                    EventKind::Remove(_) => ChangeKind::Removed,
                    _ => return,
                };
                for path in event.paths {
                    let _ = raw_tx.send(RawWatchEvent {
                        library_id,
                        library_root: library_root.clone(),
                        kind,
                        path,
                    });
                }
            }
            Err(e) => log::error!("watch backend error: {}", e),
        },
        Config::default(),
    )?;

    watcher.watch(path, RecursiveMode::Recursive)?;
    Ok(watcher)
}

/// Receive raw events, debounce per path, enqueue stabilized ones.
async fn run_debounce_loop(
    mut raw_rx: mpsc::UnboundedReceiver<RawWatchEvent>,
    queue: Arc<dyn JobQueue>,
    bus: Arc<EventBus>,
    config: WatcherConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut pending: HashMap<PathBuf, PendingEntry> = HashMap::new();
    let mut flush_tick = tokio::time::interval(config.flush_interval);

    loop {
        tokio::select! {
            maybe_event = raw_rx.recv() => {
                match maybe_event {
                    Some(event) => accumulate_event(&mut pending, event, &bus),
                    None => break,
                }
            }
            _ = flush_tick.tick() => {
                flush_stabilized(&mut pending, config.quiet_period, &queue, &bus);
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }
}

/// Fold one raw event into the pending map. Removals pass straight
/// through as observability events; they never touch the catalog.
fn accumulate_event(
    pending: &mut HashMap<PathBuf, PendingEntry>,
    event: RawWatchEvent,
    bus: &Arc<EventBus>,
) {
    if is_hidden_within(&event.library_root, &event.path) || !is_comic_file(&event.path) {
        return;
    }

    match event.kind {
        ChangeKind::Removed => {
            pending.remove(&event.path);
            log::info!("file removed: {}", event.path.display());
            bus.emit(FileRemoved::new(event.path, event.library_id));
        }
        ChangeKind::Created | ChangeKind::Modified => {
            let now = Instant::now();
            pending
                .entry(event.path)
                .and_modify(|entry| entry.last_activity = now)
                .or_insert(PendingEntry {
                    library_id: event.library_id,
                    kind: event.kind,
                    last_activity: now,
                });
        }
    }
}

/// Enqueue a NewComicFile job for every pending path whose last write
/// activity is older than the quiet period.
fn flush_stabilized(
    pending: &mut HashMap<PathBuf, PendingEntry>,
    quiet_period: Duration,
    queue: &Arc<dyn JobQueue>,
    bus: &Arc<EventBus>,
) {
    let now = Instant::now();
    let ready: Vec<PathBuf> = pending
        .iter()
        .filter(|(_, entry)| now.duration_since(entry.last_activity) >= quiet_period)
        .map(|(path, _)| path.clone())
        .collect();

    for path in ready {
        let Some(entry) = pending.remove(&path) else {
            continue;
        };

        let change = match entry.kind {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Removed => continue,
        };

        let payload = JobPayload::NewComicFile {
            file_path: path.clone(),
            library_id: entry.library_id,
        };
        match queue.enqueue(payload) {
            Ok(job_id) => {
                log::info!("stabilized {} at {}, ingestion queued", change, path.display());
                bus.emit(FileDiscovered::new(
                    path.clone(),
                    entry.library_id,
                    change.to_string(),
                ));
                bus.emit(JobEnqueued::new(job_id, "new_comic_file".to_string()));
            }
            Err(e) => {
                log::error!("failed to enqueue {}: {}", path.display(), e);
            }
        }
    }
}

pub(crate) fn is_comic_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let lower = ext.to_ascii_lowercase();
            COMIC_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Dot-prefixed files and directories are ignored. Hidden-ness is judged
/// below the library root only, so a library that itself lives under a
/// dot-directory is still watchable.
pub(crate) fn is_hidden_within(root: &Path, path: &Path) -> bool {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|name| name.starts_with('.') && name != "." && name != "..")
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_at, initialize_database, ConnectionPool};
    use crate::domain::library::LibraryRoot;
    use crate::queue::SqliteJobQueue;
    use crate::repositories::{LibraryRepository, SqliteLibraryRepository};

    fn test_pool() -> Arc<ConnectionPool> {
        let dir = tempfile::tempdir().unwrap();
        let pool = Arc::new(create_pool_at(&dir.keep().join("test.db")).unwrap());
        initialize_database(&pool.get().unwrap()).unwrap();
        pool
    }

    fn raw(kind: ChangeKind, path: &str) -> RawWatchEvent {
        RawWatchEvent {
            library_id: Uuid::new_v4(),
            library_root: PathBuf::from("/lib"),
            kind,
            path: PathBuf::from(path),
        }
    }

    #[test]
    fn test_comic_file_detection() {
        assert!(is_comic_file(Path::new("/lib/Batman 001.cbz")));
        assert!(is_comic_file(Path::new("/lib/Batman 001.CBR")));
        assert!(!is_comic_file(Path::new("/lib/cover.jpg")));
        assert!(!is_comic_file(Path::new("/lib/notes")));
    }

    #[test]
    fn test_hidden_paths_detected() {
        let root = Path::new("/lib");
        assert!(is_hidden_within(root, Path::new("/lib/.hidden.cbz")));
        assert!(is_hidden_within(root, Path::new("/lib/.staging/Batman 001.cbz")));
        assert!(!is_hidden_within(root, Path::new("/lib/Batman (2011)/Batman 001.cbz")));

        // A dot-component above the root does not hide the library's files
        let dotted_root = Path::new("/home/user/.comics");
        assert!(!is_hidden_within(
            dotted_root,
            Path::new("/home/user/.comics/Batman (2011)/Batman 001.cbz")
        ));
    }

    #[test]
    fn test_irrelevant_events_are_filtered() {
        let bus = Arc::new(EventBus::new());
        let mut pending = HashMap::new();

        accumulate_event(&mut pending, raw(ChangeKind::Created, "/lib/cover.jpg"), &bus);
        accumulate_event(&mut pending, raw(ChangeKind::Created, "/lib/.tmp.cbz"), &bus);

        assert!(pending.is_empty());
    }

    #[test]
    fn test_stabilized_add_enqueues_one_job() {
        let pool = test_pool();
        let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(pool));
        let bus = Arc::new(EventBus::new());
        let mut pending = HashMap::new();

        accumulate_event(
            &mut pending,
            raw(ChangeKind::Created, "/lib/Batman (2011)/Batman 001.cbz"),
            &bus,
        );
        assert_eq!(pending.len(), 1);

        // Quiet period zero: the entry is immediately considered stable
        flush_stabilized(&mut pending, Duration::ZERO, &queue, &bus);

        assert!(pending.is_empty());
        assert_eq!(queue.pending_count().unwrap(), 1);
    }

    #[test]
    fn test_write_activity_resets_the_quiet_period() {
        let pool = test_pool();
        let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(pool));
        let bus = Arc::new(EventBus::new());
        let mut pending = HashMap::new();

        accumulate_event(
            &mut pending,
            raw(ChangeKind::Created, "/lib/Batman (2011)/Batman 001.cbz"),
            &bus,
        );

        // Still inside the quiet period: nothing flushes
        flush_stabilized(&mut pending, Duration::from_secs(60), &queue, &bus);
        assert_eq!(pending.len(), 1);
        assert_eq!(queue.pending_count().unwrap(), 0);
    }

    #[test]
    fn test_removal_never_enqueues_ingestion() {
        let pool = test_pool();
        let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(pool));
        let bus = Arc::new(EventBus::new());
        let mut pending = HashMap::new();

        accumulate_event(
            &mut pending,
            raw(ChangeKind::Created, "/lib/Batman (2011)/Batman 001.cbz"),
            &bus,
        );
        accumulate_event(
            &mut pending,
            raw(ChangeKind::Removed, "/lib/Batman (2011)/Batman 001.cbz"),
            &bus,
        );

        // The pending add was cancelled by the removal
        flush_stabilized(&mut pending, Duration::ZERO, &queue, &bus);
        assert_eq!(queue.pending_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reconcile_tracks_library_configuration() {
        let pool = test_pool();
        let library_repo_impl = SqliteLibraryRepository::new(pool.clone());

        let library_dir = tempfile::tempdir().unwrap();
        let mut library = LibraryRoot::new(
            "Comics".to_string(),
            library_dir.path().to_path_buf(),
        );
        library_repo_impl.save(&library).unwrap();

        let library_repo: Arc<dyn LibraryRepository> =
            Arc::new(SqliteLibraryRepository::new(pool.clone()));
        let watched = Arc::new(Mutex::new(HashMap::new()));
        let (raw_tx, _raw_rx) = mpsc::unbounded_channel();
        let bus = Arc::new(EventBus::new());

        reconcile_once(&library_repo, &watched, &raw_tx, &bus).await;
        assert_eq!(watched.lock().await.len(), 1);

        // A second pass is a no-op
        reconcile_once(&library_repo, &watched, &raw_tx, &bus).await;
        assert_eq!(watched.lock().await.len(), 1);

        // Disabling the library unwatches it on the next pass
        library.enabled = false;
        library_repo_impl.save(&library).unwrap();
        reconcile_once(&library_repo, &watched, &raw_tx, &bus).await;
        assert_eq!(watched.lock().await.len(), 0);
    }

    #[tokio::test]
    async fn test_watcher_start_and_stop() {
        let pool = test_pool();
        let library_dir = tempfile::tempdir().unwrap();
        let library = LibraryRoot::new(
            "Comics".to_string(),
            library_dir.path().to_path_buf(),
        );
        SqliteLibraryRepository::new(pool.clone())
            .save(&library)
            .unwrap();

        let watcher = LibraryWatcher::new(
            Arc::new(SqliteLibraryRepository::new(pool.clone())),
            Arc::new(SqliteJobQueue::new(pool)),
            Arc::new(EventBus::new()),
            WatcherConfig::default(),
        );

        watcher.start().await.unwrap();
        assert_eq!(watcher.watched_count().await, 1);

        // Starting twice is an explicit error, not a second set of loops
        assert!(watcher.start().await.is_err());

        watcher.stop().await;
        assert_eq!(watcher.watched_count().await, 0);
    }
}
