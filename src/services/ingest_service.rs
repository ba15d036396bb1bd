// src/services/ingest_service.rs
//
// NewComicFile pipeline stage.
//
// Steps, in order:
// 1. look up any existing catalog record by file path
// 2. compute the current content hash
// 3. unchanged hash → the job completes as a no-op
// 4. parse file and folder names
// 5. read and standardize embedded metadata; a read failure degrades to
//    name-derived data, it never fails the job
// 6. upsert the comic record
// 7. spawn a ProcessComicSeries job when the parent folder has no series
//
// Duplicate delivery of the same file path is harmless: the unique
// file-path index plus the hash short-circuit make reprocessing a no-op.

use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::comic::{validate_comic, Comic};
use crate::error::{AppError, AppResult};
use crate::events::{ComicUnchanged, ComicUpserted, EventBus, JobEnqueued};
use crate::infrastructure::MetadataReader;
use crate::queue::{JobPayload, JobQueue};
use crate::repositories::{ComicRepository, SeriesRepository};
use crate::services::hash_service::HashService;
use crate::services::metadata_service::MetadataStandardizer;
use crate::services::name_parser::NameParser;

/// What a NewComicFile job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Stored hash matched the file; nothing was written
    Unchanged { comic_id: Uuid },

    Created {
        comic_id: Uuid,
        series_job_spawned: bool,
    },

    Updated {
        comic_id: Uuid,
        series_job_spawned: bool,
    },
}

pub struct IngestService {
    comic_repo: Arc<dyn ComicRepository>,
    series_repo: Arc<dyn SeriesRepository>,
    queue: Arc<dyn JobQueue>,
    hash_service: Arc<HashService>,
    metadata_reader: Arc<dyn MetadataReader>,
    standardizer: Arc<MetadataStandardizer>,
    parser: NameParser,
    event_bus: Arc<EventBus>,
}

impl IngestService {
    pub fn new(
        comic_repo: Arc<dyn ComicRepository>,
        series_repo: Arc<dyn SeriesRepository>,
        queue: Arc<dyn JobQueue>,
        hash_service: Arc<HashService>,
        metadata_reader: Arc<dyn MetadataReader>,
        standardizer: Arc<MetadataStandardizer>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            comic_repo,
            series_repo,
            queue,
            hash_service,
            metadata_reader,
            standardizer,
            parser: NameParser::default(),
            event_bus,
        }
    }

    /// Handle one NewComicFile job.
    pub fn process_new_file(&self, file_path: &Path, library_id: Uuid) -> AppResult<IngestOutcome> {
        let path_str = file_path.to_string_lossy().to_string();

        // Step 1: existing record, if any
        let existing = self.comic_repo.get_by_file_path(&path_str)?;

        // Step 2: current content hash
        let digest = self.hash_service.hash_file(file_path)?;

        // Step 3: hash gate
        if let Some(ref comic) = existing {
            if comic.has_same_content(&digest) {
                log::debug!("{} unchanged, skipping", file_path.display());
                self.event_bus
                    .emit(ComicUnchanged::new(comic.id, file_path.to_path_buf()));
                return Ok(IngestOutcome::Unchanged { comic_id: comic.id });
            }
        }

        // Step 4: name-derived properties
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let file_props = self.parser.parse_file_name(file_name);

        let folder_name = file_path
            .parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let folder_props = self.parser.parse_folder_name(folder_name);

        // Step 5: embedded metadata, best-effort
        let raw = match self.metadata_reader.read_embedded(file_path) {
            Ok(Some(raw)) => {
                log::debug!(
                    "read {} metadata from {}",
                    raw.format_name(),
                    file_path.display()
                );
                Some(raw)
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!(
                    "could not read embedded metadata from {}: {}",
                    file_path.display(),
                    e
                );
                None
            }
        };
        let metadata = self
            .standardizer
            .standardize(raw.as_ref(), &file_props, &folder_props);
        if metadata.is_none() {
            log::debug!(
                "no embedded metadata in {}, using name-derived fields",
                file_path.display()
            );
        }

        // Step 6: upsert
        let created = existing.is_none();
        let mut comic = match existing {
            Some(mut comic) => {
                comic.set_hash(digest);
                comic
            }
            None => Comic::new(library_id, file_path.to_path_buf(), digest),
        };

        match &metadata {
            Some(meta) => {
                comic.title = meta.title.clone();
                comic.series_title = meta.series.clone();
                comic.issue_number = meta.number.clone();
                comic.volume_number = meta.volume.clone();
                comic.year = meta.year.clone();
                comic.tags = meta.tags.clone();
                comic.page_count = meta.page_count;
            }
            None => {
                comic.title = String::new();
                comic.series_title = if file_props.series_name.is_empty() {
                    folder_props.series_name.clone()
                } else {
                    file_props.series_name.clone()
                };
                comic.issue_number = file_props.issue_number.clone();
                comic.volume_number = if file_props.volume_number.is_empty() {
                    folder_props.series_volume.clone()
                } else {
                    file_props.volume_number.clone()
                };
                comic.year = if file_props.year.is_empty() {
                    folder_props.series_year.clone()
                } else {
                    file_props.year.clone()
                };
                comic.tags = file_props.tags.clone();
            }
        }
        comic.touch();

        validate_comic(&comic).map_err(AppError::Domain)?;
        let comic_id = self.comic_repo.upsert(&comic)?;

        log::info!(
            "{} comic {} ({} #{})",
            if created { "catalogued" } else { "updated" },
            file_path.display(),
            comic.series_title,
            comic.issue_number
        );
        self.event_bus.emit(ComicUpserted::new(
            comic_id,
            file_path.to_path_buf(),
            comic.series_title.clone(),
            comic.issue_number.clone(),
            created,
        ));

        // Step 7: series stage, only when the folder has no series yet
        let mut series_job_spawned = false;
        if let Some(folder) = file_path.parent() {
            let folder_str = folder.to_string_lossy().to_string();
            if self.series_repo.get_by_folder_path(&folder_str)?.is_none() {
                let payload = JobPayload::ProcessComicSeries {
                    series_path: folder.to_path_buf(),
                    comic_id,
                    metadata: metadata.clone(),
                };
                let job_id = self.queue.enqueue(payload)?;
                self.event_bus
                    .emit(JobEnqueued::new(job_id, "process_comic_series".to_string()));
                series_job_spawned = true;
            }
        }

        if created {
            Ok(IngestOutcome::Created {
                comic_id,
                series_job_spawned,
            })
        } else {
            Ok(IngestOutcome::Updated {
                comic_id,
                series_job_spawned,
            })
        }
    }
}
