// src/main.rs

use std::sync::Arc;

use comichub::db::{create_connection_pool, initialize_database};
use comichub::events::EventBus;
use comichub::infrastructure::{MetadataReader, ZipMetadataReader};
use comichub::queue::{JobQueue, SqliteJobQueue, WorkerConfig, WorkerPool};
use comichub::repositories::*;
use comichub::services::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. INFRASTRUCTURE
    let event_bus = Arc::new(EventBus::new());
    let pool = Arc::new(create_connection_pool()?);

    // Initialize schema (idempotent)
    {
        let conn = pool.get()?;
        initialize_database(&conn)?;
    }

    // 2. REPOSITORIES AND QUEUE
    // The type `Arc<dyn Trait>` is used to match the service constructor signatures exactly.
    let comic_repo: Arc<dyn ComicRepository> = Arc::new(SqliteComicRepository::new(pool.clone()));
    let series_repo: Arc<dyn SeriesRepository> =
        Arc::new(SqliteSeriesRepository::new(pool.clone()));
    let library_repo: Arc<dyn LibraryRepository> =
        Arc::new(SqliteLibraryRepository::new(pool.clone()));
    let queue: Arc<dyn JobQueue> = Arc::new(SqliteJobQueue::new(pool.clone()));
    let metadata_reader: Arc<dyn MetadataReader> = Arc::new(ZipMetadataReader::new());

    // Redeliver anything a previous process left mid-attempt
    let requeued = queue.requeue_stale_active(chrono::Utc::now())?;
    if requeued > 0 {
        log::info!("requeued {} interrupted jobs", requeued);
    }

    // 3. SERVICES
    let hash_service = Arc::new(HashService::new());
    let standardizer = Arc::new(MetadataStandardizer::new());
    let ingest_service = Arc::new(IngestService::new(
        comic_repo.clone(),
        series_repo.clone(),
        queue.clone(),
        hash_service.clone(),
        metadata_reader.clone(),
        standardizer.clone(),
        event_bus.clone(),
    ));
    let series_service = Arc::new(SeriesService::new(
        series_repo.clone(),
        comic_repo.clone(),
        event_bus.clone(),
    ));

    // 4. WORKERS
    let worker_pool = WorkerPool::new(
        queue.clone(),
        ingest_service.clone(),
        series_service.clone(),
        event_bus.clone(),
        WorkerConfig::default(),
    );
    worker_pool.start();

    // 5. INITIAL SCAN
    // Pick up everything already on disk; the watcher only sees changes
    // made while the process is running.
    let scan_service = Arc::new(ScanService::new(
        queue.clone(),
        hash_service.clone(),
        event_bus.clone(),
    ));
    {
        let libraries = library_repo.list_enabled()?;
        let scan_service = scan_service.clone();
        tokio::task::spawn_blocking(move || {
            for library in libraries {
                match scan_service.scan_library(&library) {
                    Ok(ScanOutcome::Unchanged) => {
                        log::info!("library '{}' unchanged since last scan", library.name);
                    }
                    Ok(ScanOutcome::Scanned { files_enqueued }) => {
                        log::info!(
                            "library '{}' scanned, {} files queued",
                            library.name,
                            files_enqueued
                        );
                    }
                    Err(e) => log::error!("scan of '{}' failed: {}", library.name, e),
                }
            }
        })
        .await?;
    }

    // 6. WATCHER
    let watcher = LibraryWatcher::new(
        library_repo.clone(),
        queue.clone(),
        event_bus.clone(),
        WatcherConfig::default(),
    );
    watcher.start().await?;
    log::info!("comichub running, watching {} libraries", watcher.watched_count().await);

    // 7. RUN UNTIL INTERRUPTED
    tokio::signal::ctrl_c().await?;
    log::info!("shutting down");

    watcher.stop().await;
    worker_pool.stop().await;

    Ok(())
}
