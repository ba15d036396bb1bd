// src/queue/worker.rs
//
// Worker pool consuming the durable queue.
//
// N tokio tasks poll the queue; each claimed job is dispatched to the
// matching pipeline service on the blocking thread pool (hashing and
// SQLite work are blocking). A failing attempt goes back through the
// retry policy; an exhausted job stays dead-lettered in the queue.

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::AppError;
use crate::events::{EventBus, JobCompleted, JobFailed};
use crate::queue::backend::JobQueue;
use crate::queue::job::{Job, JobPayload, JobState, RetryPolicy};
use crate::services::ingest_service::IngestService;
use crate::services::series_service::SeriesService;

/// Tunables for the worker pool.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Concurrent worker tasks; also bounds concurrent hashing
    pub worker_count: usize,

    /// How long an idle worker sleeps before polling again
    pub poll_interval: Duration,

    pub retry_policy: RetryPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            poll_interval: Duration::from_millis(500),
            retry_policy: RetryPolicy::default(),
        }
    }
}

pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    ingest_service: Arc<IngestService>,
    series_service: Arc<SeriesService>,
    event_bus: Arc<EventBus>,
    config: WorkerConfig,

    shutdown_tx: watch::Sender<bool>,
    handles: std::sync::Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        ingest_service: Arc<IngestService>,
        series_service: Arc<SeriesService>,
        event_bus: Arc<EventBus>,
        config: WorkerConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            queue,
            ingest_service,
            series_service,
            event_bus,
            config,
            shutdown_tx,
            handles: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Spawn the worker tasks. Call once.
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap();

        for worker_idx in 0..self.config.worker_count {
            let queue = Arc::clone(&self.queue);
            let ingest = Arc::clone(&self.ingest_service);
            let series = Arc::clone(&self.series_service);
            let bus = Arc::clone(&self.event_bus);
            let config = self.config.clone();
            let shutdown_rx = self.shutdown_tx.subscribe();

            handles.push(tokio::spawn(async move {
                run_worker(worker_idx, queue, ingest, series, bus, config, shutdown_rx).await;
            }));
        }

        log::info!("started {} queue workers", self.config.worker_count);
    }

    /// Signal shutdown and wait for in-flight jobs to finish.
    pub async fn stop(&self) {
        let _ = self.shutdown_tx.send(true);

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().unwrap();
            guard.drain(..).collect()
        };

        for handle in handles {
            let _ = handle.await;
        }

        log::info!("queue workers stopped");
    }
}

async fn run_worker(
    worker_idx: usize,
    queue: Arc<dyn JobQueue>,
    ingest: Arc<IngestService>,
    series: Arc<SeriesService>,
    bus: Arc<EventBus>,
    config: WorkerConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    log::debug!("worker {} running", worker_idx);

    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        match queue.claim_ready(Utc::now()) {
            Ok(Some(job)) => {
                handle_job(job, &queue, &ingest, &series, &bus, &config).await;
            }
            Ok(None) => {
                // Idle: sleep until the next poll or shutdown
                tokio::select! {
                    _ = tokio::time::sleep(config.poll_interval) => {}
                    _ = shutdown_rx.changed() => {}
                }
            }
            Err(e) => {
                log::error!("worker {} failed to poll queue: {}", worker_idx, e);
                tokio::time::sleep(config.poll_interval).await;
            }
        }
    }

    log::debug!("worker {} exiting", worker_idx);
}

async fn handle_job(
    job: Job,
    queue: &Arc<dyn JobQueue>,
    ingest: &Arc<IngestService>,
    series: &Arc<SeriesService>,
    bus: &Arc<EventBus>,
    config: &WorkerConfig,
) {
    let job_id = job.id;
    let kind = job.kind();
    let attempts = job.attempts;
    let started = Instant::now();

    // Exhaustive dispatch over the payload union
    let outcome = {
        let ingest = Arc::clone(ingest);
        let series = Arc::clone(series);
        let payload = job.payload.clone();

        tokio::task::spawn_blocking(move || match payload {
            JobPayload::NewComicFile {
                file_path,
                library_id,
            } => ingest.process_new_file(&file_path, library_id).map(|_| ()),
            JobPayload::ProcessComicSeries {
                series_path,
                comic_id,
                metadata,
            } => series
                .process_series(&series_path, comic_id, metadata.as_ref())
                .map(|_| ()),
        })
        .await
    };

    let result = match outcome {
        Ok(inner) => inner,
        Err(join_err) => Err(AppError::Other(format!("job task panicked: {}", join_err))),
    };

    match result {
        Ok(()) => {
            if let Err(e) = queue.complete(job_id) {
                log::error!("failed to mark job {} completed: {}", job_id, e);
                return;
            }
            let duration_ms = started.elapsed().as_millis() as u64;
            log::info!("job {} ({}) completed in {}ms", job_id, kind, duration_ms);
            bus.emit(JobCompleted::new(job_id, kind.to_string(), duration_ms));
        }
        Err(err) => {
            let message = err.to_string();
            match queue.fail_attempt(job_id, &message, &config.retry_policy, Utc::now()) {
                Ok(state) => {
                    let dead_lettered = state == JobState::Failed;
                    if dead_lettered {
                        log::error!(
                            "job {} ({}) failed permanently after {} attempts: {}",
                            job_id,
                            kind,
                            attempts,
                            message
                        );
                    } else {
                        log::warn!(
                            "job {} ({}) attempt {} failed, will retry: {}",
                            job_id,
                            kind,
                            attempts,
                            message
                        );
                    }
                    bus.emit(JobFailed::new(
                        job_id,
                        kind.to_string(),
                        attempts,
                        message,
                        dead_lettered,
                    ));
                }
                Err(e) => {
                    log::error!("failed to record failure for job {}: {}", job_id, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_at, initialize_database, ConnectionPool};
    use crate::domain::library::LibraryRoot;
    use crate::infrastructure::MockMetadataReader;
    use crate::queue::backend::SqliteJobQueue;
    use crate::queue::job::{BackoffStrategy, JobPayload};
    use crate::repositories::{
        ComicRepository, LibraryRepository, SeriesRepository, SqliteComicRepository,
        SqliteLibraryRepository, SqliteSeriesRepository,
    };
    use crate::services::metadata_service::MetadataStandardizer;
    use std::path::PathBuf;
    use uuid::Uuid;

    struct Fixture {
        queue: Arc<dyn JobQueue>,
        comic_repo: Arc<SqliteComicRepository>,
        series_repo: Arc<SqliteSeriesRepository>,
        pool: Arc<WorkerPool>,
        library_id: Uuid,
        library_dir: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.keep();
        let db_pool: Arc<ConnectionPool> = Arc::new(create_pool_at(&root.join("test.db")).unwrap());
        initialize_database(&db_pool.get().unwrap()).unwrap();

        let library_dir = root.join("library");
        std::fs::create_dir_all(library_dir.join("Batman (2011)")).unwrap();
        let library = LibraryRoot::new("Comics".to_string(), library_dir.clone());
        SqliteLibraryRepository::new(db_pool.clone())
            .save(&library)
            .unwrap();

        let comic_repo = Arc::new(SqliteComicRepository::new(db_pool.clone()));
        let series_repo = Arc::new(SqliteSeriesRepository::new(db_pool.clone()));
        let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(db_pool.clone()));

        let mut reader = MockMetadataReader::new();
        reader.expect_read_embedded().returning(|_| Ok(None));

        let ingest = Arc::new(IngestService::new(
            comic_repo.clone(),
            series_repo.clone(),
            queue.clone(),
            Arc::new(crate::services::hash_service::HashService::new()),
            Arc::new(reader),
            Arc::new(MetadataStandardizer::new()),
            Arc::new(EventBus::new()),
        ));
        let series = Arc::new(SeriesService::new(
            series_repo.clone(),
            comic_repo.clone(),
            Arc::new(EventBus::new()),
        ));

        let config = WorkerConfig {
            worker_count: 2,
            poll_interval: Duration::from_millis(20),
            retry_policy: RetryPolicy {
                max_attempts: 1,
                backoff_base: Duration::from_millis(10),
                strategy: BackoffStrategy::Fixed,
            },
        };
        let pool = Arc::new(WorkerPool::new(
            queue.clone(),
            ingest,
            series,
            Arc::new(EventBus::new()),
            config,
        ));

        Fixture {
            queue,
            comic_repo,
            series_repo,
            pool,
            library_id: library.id,
            library_dir,
        }
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
        for _ in 0..200 {
            if condition() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        false
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pool_runs_both_pipeline_stages() {
        let fixture = fixture();
        let file_path = fixture
            .library_dir
            .join("Batman (2011)")
            .join("Batman 001 (2011).cbz");
        std::fs::write(&file_path, b"issue one bytes").unwrap();

        fixture
            .queue
            .enqueue(JobPayload::NewComicFile {
                file_path: file_path.clone(),
                library_id: fixture.library_id,
            })
            .unwrap();

        fixture.pool.start();

        let comic_repo = fixture.comic_repo.clone();
        let path_str = file_path.to_string_lossy().to_string();
        let done = wait_until(move || {
            comic_repo
                .get_by_file_path(&path_str)
                .unwrap()
                .map(|comic| comic.series_id.is_some())
                .unwrap_or(false)
        })
        .await;

        fixture.pool.stop().await;
        assert!(done, "comic should be catalogued and linked to its series");

        let folder_str = file_path.parent().unwrap().to_string_lossy().to_string();
        let series = fixture
            .series_repo
            .get_by_folder_path(&folder_str)
            .unwrap()
            .expect("series record");
        assert_eq!(series.title, "Batman");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_exhausted_job_is_dead_lettered() {
        let fixture = fixture();

        // The file never exists, so every attempt fails; max_attempts is 1
        fixture
            .queue
            .enqueue(JobPayload::NewComicFile {
                file_path: fixture.library_dir.join("Batman (2011)").join("ghost.cbz"),
                library_id: fixture.library_id,
            })
            .unwrap();

        fixture.pool.start();

        let queue = fixture.queue.clone();
        let done = wait_until(move || queue.list_failed().map(|f| f.len() == 1).unwrap_or(false)).await;

        fixture.pool.stop().await;
        assert!(done, "job should land in the dead letter set");

        let failed = fixture.queue.list_failed().unwrap();
        assert_eq!(failed[0].attempts, 1);
        assert!(failed[0].last_error.as_deref().unwrap_or("").contains("not found"));
    }
}
