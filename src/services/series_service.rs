// src/services/series_service.rs
//
// ProcessComicSeries pipeline stage.
//
// Resolves or creates the series record keyed by folder path, then links
// the spawning comic to it. Idempotent: the unique folder-path index
// guarantees one series per folder, and re-linking is a plain update.

use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::metadata::StandardizedMetadata;
use crate::domain::series::{validate_series, Series};
use crate::error::{AppError, AppResult};
use crate::events::{ComicLinkedToSeries, EventBus, SeriesCreated};
use crate::repositories::{ComicRepository, SeriesRepository};
use crate::services::name_parser::NameParser;

/// What a ProcessComicSeries job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesOutcome {
    pub series_id: Uuid,
    /// true when this run created the series record
    pub created: bool,
}

pub struct SeriesService {
    series_repo: Arc<dyn SeriesRepository>,
    comic_repo: Arc<dyn ComicRepository>,
    parser: NameParser,
    event_bus: Arc<EventBus>,
}

impl SeriesService {
    pub fn new(
        series_repo: Arc<dyn SeriesRepository>,
        comic_repo: Arc<dyn ComicRepository>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            series_repo,
            comic_repo,
            parser: NameParser::default(),
            event_bus,
        }
    }

    /// Handle one ProcessComicSeries job.
    pub fn process_series(
        &self,
        series_path: &Path,
        comic_id: Uuid,
        metadata: Option<&StandardizedMetadata>,
    ) -> AppResult<SeriesOutcome> {
        let path_str = series_path.to_string_lossy().to_string();

        // Step 1: resolve or create the series for this folder
        let (series_id, created) = match self.series_repo.get_by_folder_path(&path_str)? {
            Some(series) => (series.id, false),
            None => {
                let series = self.build_series(series_path, metadata);
                validate_series(&series).map_err(AppError::Domain)?;
                let id = self.series_repo.upsert(&series)?;

                log::info!(
                    "created series '{}' for {}",
                    series.title,
                    series_path.display()
                );
                self.event_bus.emit(SeriesCreated::new(
                    id,
                    series.folder_path.clone(),
                    series.title.clone(),
                ));
                (id, true)
            }
        };

        // Step 2: link the comic. A missing comic row means the spawning
        // job's write is not visible yet; fail the attempt and let the
        // retry policy take it.
        if !self.comic_repo.link_to_series(comic_id, series_id)? {
            return Err(AppError::NotFound);
        }
        self.event_bus
            .emit(ComicLinkedToSeries::new(comic_id, series_id));

        Ok(SeriesOutcome { series_id, created })
    }

    /// Build a new series entity, preferring embedded metadata over the
    /// folder-derived name, field by field.
    fn build_series(
        &self,
        series_path: &Path,
        metadata: Option<&StandardizedMetadata>,
    ) -> Series {
        let folder_name = series_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let folder_props = self.parser.parse_folder_name(folder_name);

        let embedded_series = metadata
            .map(|m| m.series.trim())
            .filter(|s| !s.is_empty());

        let title = match embedded_series {
            Some(series) => series.to_string(),
            None if !folder_props.series_name.is_empty() => folder_props.series_name.clone(),
            None => folder_name.to_string(),
        };

        let mut series = Series::new(series_path.to_path_buf(), title);

        series.year = metadata
            .map(|m| m.year.clone())
            .filter(|y| !y.is_empty())
            .unwrap_or(folder_props.series_year);

        series.volume = metadata
            .map(|m| m.volume.clone())
            .filter(|v| !v.is_empty())
            .unwrap_or(folder_props.series_volume);

        series.tags = folder_props.series_tags;

        series
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool_at, initialize_database, ConnectionPool};
    use crate::domain::comic::Comic;
    use crate::domain::library::LibraryRoot;
    use crate::repositories::{
        LibraryRepository, SqliteComicRepository, SqliteLibraryRepository, SqliteSeriesRepository,
    };
    use std::path::PathBuf;

    struct Fixture {
        comic_repo: Arc<SqliteComicRepository>,
        series_repo: Arc<SqliteSeriesRepository>,
        service: SeriesService,
        comic_id: Uuid,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let pool: Arc<ConnectionPool> =
            Arc::new(create_pool_at(&dir.keep().join("test.db")).unwrap());
        initialize_database(&pool.get().unwrap()).unwrap();

        let library = LibraryRoot::new("Comics".to_string(), PathBuf::from("/lib"));
        SqliteLibraryRepository::new(pool.clone())
            .save(&library)
            .unwrap();

        let comic_repo = Arc::new(SqliteComicRepository::new(pool.clone()));
        let comic = Comic::new(
            library.id,
            PathBuf::from("/lib/Daredevil v4 [Mature Readers]/Daredevil 001.cbz"),
            "c".repeat(64),
        );
        crate::repositories::ComicRepository::upsert(&*comic_repo, &comic).unwrap();

        let series_repo = Arc::new(SqliteSeriesRepository::new(pool.clone()));
        let service = SeriesService::new(
            series_repo.clone(),
            comic_repo.clone(),
            Arc::new(EventBus::new()),
        );

        Fixture {
            comic_repo,
            series_repo,
            service,
            comic_id: comic.id,
        }
    }

    #[test]
    fn test_creates_series_from_folder_name_and_links() {
        let fixture = fixture();
        let folder = PathBuf::from("/lib/Daredevil v4 [Mature Readers]");

        let outcome = fixture
            .service
            .process_series(&folder, fixture.comic_id, None)
            .unwrap();
        assert!(outcome.created);

        let series = fixture
            .series_repo
            .get_by_folder_path("/lib/Daredevil v4 [Mature Readers]")
            .unwrap()
            .expect("series created");
        assert_eq!(series.title, "Daredevil");
        assert_eq!(series.volume, "4");
        assert_eq!(series.tags, vec!["Mature Readers".to_string()]);

        let comic = fixture
            .comic_repo
            .get_by_id(fixture.comic_id)
            .unwrap()
            .unwrap();
        assert_eq!(comic.series_id, Some(series.id));
    }

    #[test]
    fn test_embedded_series_title_preferred_over_folder_name() {
        let fixture = fixture();
        let folder = PathBuf::from("/lib/Daredevil v4 [Mature Readers]");

        let metadata = StandardizedMetadata {
            series: "Daredevil: The Man Without Fear".to_string(),
            ..StandardizedMetadata::default()
        };

        fixture
            .service
            .process_series(&folder, fixture.comic_id, Some(&metadata))
            .unwrap();

        let series = fixture
            .series_repo
            .get_by_folder_path("/lib/Daredevil v4 [Mature Readers]")
            .unwrap()
            .unwrap();
        assert_eq!(series.title, "Daredevil: The Man Without Fear");
        // Folder still supplies what the metadata lacked
        assert_eq!(series.volume, "4");
    }

    #[test]
    fn test_second_run_reuses_existing_series() {
        let fixture = fixture();
        let folder = PathBuf::from("/lib/Daredevil v4 [Mature Readers]");

        let first = fixture
            .service
            .process_series(&folder, fixture.comic_id, None)
            .unwrap();
        let second = fixture
            .service
            .process_series(&folder, fixture.comic_id, None)
            .unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.series_id, second.series_id);
    }

    #[test]
    fn test_missing_comic_fails_the_attempt() {
        let fixture = fixture();
        let folder = PathBuf::from("/lib/Daredevil v4 [Mature Readers]");

        let result = fixture
            .service
            .process_series(&folder, Uuid::new_v4(), None);
        assert!(matches!(result, Err(AppError::NotFound)));
    }
}
