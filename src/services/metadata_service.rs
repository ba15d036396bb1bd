// src/services/metadata_service.rs
//
// Metadata standardization and merge.
//
// CRITICAL RULES:
// - No embedded metadata → None; the caller falls back to parsed names
// - Per-field precedence: embedded (present and non-empty) >
//   parsed-filename > parsed-folder > absent
// - Comma-separated creator strings are split, trimmed, empties dropped
// - "Yes"/"No"/unset source flags map to true/false/absent
// - Both embedded formats standardize into the same canonical shape; the
//   leaner format has no reading-direction concept and the field stays
//   absent rather than guessed

use crate::domain::metadata::{
    ComicBookInfo, ComicInfo, MangaMode, PageInfo, RawMetadata, StandardizedMetadata,
};
use crate::domain::naming::{ParsedFileProps, ParsedFolderProps};

#[derive(Debug, Default)]
pub struct MetadataStandardizer;

impl MetadataStandardizer {
    pub fn new() -> Self {
        Self
    }

    pub fn standardize(
        &self,
        raw: Option<&RawMetadata>,
        file: &ParsedFileProps,
        folder: &ParsedFolderProps,
    ) -> Option<StandardizedMetadata> {
        let raw = raw?;

        let standardized = match raw {
            RawMetadata::ComicInfo(info) => self.from_comic_info(info, file, folder),
            RawMetadata::ComicBookInfo(info) => self.from_comic_book_info(info, file, folder),
        };

        Some(standardized)
    }

    fn from_comic_info(
        &self,
        info: &ComicInfo,
        file: &ParsedFileProps,
        folder: &ParsedFolderProps,
    ) -> StandardizedMetadata {
        let year_text = info.year.map(|y| y.to_string());

        StandardizedMetadata {
            title: text_or_empty(info.title.as_deref()),
            series: merge_field(info.series.as_deref(), &file.series_name, &folder.series_name),
            number: merge_field(info.number.as_deref(), &file.issue_number, ""),
            volume: merge_field(
                info.volume.as_deref(),
                &file.volume_number,
                &folder.series_volume,
            ),
            count: info.count.and_then(to_u32),
            publisher: text_or_empty(info.publisher.as_deref()),
            imprint: text_or_empty(info.imprint.as_deref()),

            year: merge_field(year_text.as_deref(), &file.year, &folder.series_year),
            month: info.month.and_then(to_u32),
            day: info.day.and_then(to_u32),

            writers: split_list(info.writer.as_deref()),
            pencillers: split_list(info.penciller.as_deref()),
            inkers: split_list(info.inker.as_deref()),
            colorists: split_list(info.colorist.as_deref()),
            letterers: split_list(info.letterer.as_deref()),
            editors: split_list(info.editor.as_deref()),
            cover_artists: split_list(info.cover_artist.as_deref()),

            summary: text_or_empty(info.summary.as_deref()),
            genre: text_or_empty(info.genre.as_deref()),
            web: text_or_empty(info.web.as_deref()),
            page_count: info.page_count.and_then(to_u32),
            language: text_or_empty(info.language_iso.as_deref()),
            format: text_or_empty(info.format.as_deref()),

            black_and_white: tri_state(info.black_and_white.as_deref()),
            manga: manga_mode(info.manga.as_deref()),

            characters: split_list(info.characters.as_deref()),
            teams: split_list(info.teams.as_deref()),
            locations: split_list(info.locations.as_deref()),

            story_arc: text_or_empty(info.story_arc.as_deref()),
            series_group: text_or_empty(info.series_group.as_deref()),
            age_rating: text_or_empty(info.age_rating.as_deref()),
            community_rating: info.community_rating,

            tags: merge_list(&[], &file.tags, &folder.series_tags),
            pages: info
                .pages
                .iter()
                .map(|page| PageInfo {
                    image: page.image.and_then(to_u32).unwrap_or(0),
                    page_type: text_or_empty(page.page_type.as_deref()),
                    double_page: page.double_page,
                })
                .collect(),
        }
    }

    fn from_comic_book_info(
        &self,
        info: &ComicBookInfo,
        file: &ParsedFileProps,
        folder: &ParsedFolderProps,
    ) -> StandardizedMetadata {
        let issue_text = info.issue.as_ref().map(json_value_text);
        let volume_text = info.volume.as_ref().map(json_value_text);
        let year_text = info.publication_year.map(|y| y.to_string());

        let mut standardized = StandardizedMetadata {
            title: text_or_empty(info.title.as_deref()),
            series: merge_field(info.series.as_deref(), &file.series_name, &folder.series_name),
            number: merge_field(issue_text.as_deref(), &file.issue_number, ""),
            volume: merge_field(
                volume_text.as_deref(),
                &file.volume_number,
                &folder.series_volume,
            ),
            count: info.number_of_issues.and_then(to_u32),
            publisher: text_or_empty(info.publisher.as_deref()),

            year: merge_field(year_text.as_deref(), &file.year, &folder.series_year),
            month: info.publication_month.and_then(to_u32),

            summary: text_or_empty(info.comments.as_deref()),
            genre: text_or_empty(info.genre.as_deref()),
            language: text_or_empty(info.language.as_deref()),
            community_rating: info.rating,

            // The lean format has no reading-direction concept; left absent
            manga: None,
            black_and_white: None,

            tags: merge_list(&info.tags, &file.tags, &folder.series_tags),
            ..StandardizedMetadata::default()
        };

        for credit in &info.credits {
            let Some(person) = credit.person.as_deref() else {
                continue;
            };
            let person = person.trim();
            if person.is_empty() {
                continue;
            }

            let role = credit
                .role
                .as_deref()
                .map(|r| r.trim().to_lowercase())
                .unwrap_or_default();

            let bucket = match role.as_str() {
                "writer" => &mut standardized.writers,
                "penciller" | "penciler" => &mut standardized.pencillers,
                "inker" => &mut standardized.inkers,
                "colorist" | "colourist" => &mut standardized.colorists,
                "letterer" => &mut standardized.letterers,
                "editor" => &mut standardized.editors,
                "cover artist" | "cover" => &mut standardized.cover_artists,
                _ => continue,
            };
            bucket.push(person.to_string());
        }

        standardized
    }
}

// ----------------------------------------------------------------------
// Merge helpers
// ----------------------------------------------------------------------

/// Per-field precedence: embedded > parsed-filename > parsed-folder.
fn merge_field(embedded: Option<&str>, file_value: &str, folder_value: &str) -> String {
    if let Some(value) = embedded {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    if !file_value.is_empty() {
        return file_value.to_string();
    }
    folder_value.to_string()
}

fn merge_list(embedded: &[String], file_values: &[String], folder_values: &[String]) -> Vec<String> {
    if !embedded.is_empty() {
        return embedded.to_vec();
    }
    if !file_values.is_empty() {
        return file_values.to_vec();
    }
    folder_values.to_vec()
}

fn text_or_empty(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Comma-separated source string → trimmed entries, empties dropped
fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(|entry| entry.trim())
                .filter(|entry| !entry.is_empty())
                .map(|entry| entry.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// "Yes"/"No"/unset → true/false/absent; anything else is treated as unset
fn tri_state(value: Option<&str>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(ref v) if v == "yes" => Some(true),
        Some(ref v) if v == "no" => Some(false),
        _ => None,
    }
}

fn manga_mode(value: Option<&str>) -> Option<MangaMode> {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(ref v) if v == "yes" => Some(MangaMode::Yes),
        Some(ref v) if v == "no" => Some(MangaMode::No),
        Some(ref v) if v == "yesandrighttoleft" => Some(MangaMode::YesAndRightToLeft),
        _ => None,
    }
}

fn to_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok()
}

/// ComicBookInfo stores issue/volume as either a JSON number or string
fn json_value_text(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.trim().to_string(),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_props() -> ParsedFileProps {
        ParsedFileProps {
            series_name: "Bar".to_string(),
            issue_number: "1".to_string(),
            volume_number: "".to_string(),
            year: "2011".to_string(),
            tags: vec!["DC Comics".to_string()],
        }
    }

    fn folder_props() -> ParsedFolderProps {
        ParsedFolderProps {
            series_name: "Folder Series".to_string(),
            series_year: "1999".to_string(),
            series_volume: "2".to_string(),
            series_tags: vec!["Ongoing".to_string()],
        }
    }

    #[test]
    fn test_no_embedded_metadata_yields_none() {
        let standardizer = MetadataStandardizer::new();
        let result = standardizer.standardize(None, &file_props(), &folder_props());
        assert!(result.is_none());
    }

    #[test]
    fn test_embedded_series_wins_over_parsed() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicInfo(ComicInfo {
            series: Some("Foo".to_string()),
            ..ComicInfo::default()
        });

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        assert_eq!(result.series, "Foo");
    }

    #[test]
    fn test_missing_embedded_field_falls_back_to_filename_then_folder() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicInfo(ComicInfo::default());

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        // Filename supplies series and year
        assert_eq!(result.series, "Bar");
        assert_eq!(result.year, "2011");

        // Filename has no volume, so the folder value is used
        assert_eq!(result.volume, "2");
    }

    #[test]
    fn test_empty_embedded_value_is_treated_as_absent() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicInfo(ComicInfo {
            series: Some("   ".to_string()),
            ..ComicInfo::default()
        });

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        assert_eq!(result.series, "Bar");
    }

    #[test]
    fn test_creator_lists_split_and_trimmed() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicInfo(ComicInfo {
            writer: Some("Alan Moore, , Neil Gaiman ".to_string()),
            penciller: Some("Dave Gibbons".to_string()),
            ..ComicInfo::default()
        });

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        assert_eq!(
            result.writers,
            vec!["Alan Moore".to_string(), "Neil Gaiman".to_string()]
        );
        assert_eq!(result.pencillers, vec!["Dave Gibbons".to_string()]);
        assert!(result.inkers.is_empty());
    }

    #[test]
    fn test_tri_state_flags() {
        let standardizer = MetadataStandardizer::new();

        let yes = RawMetadata::ComicInfo(ComicInfo {
            black_and_white: Some("Yes".to_string()),
            manga: Some("YesAndRightToLeft".to_string()),
            ..ComicInfo::default()
        });
        let result = standardizer
            .standardize(Some(&yes), &file_props(), &folder_props())
            .unwrap();
        assert_eq!(result.black_and_white, Some(true));
        assert_eq!(result.manga, Some(MangaMode::YesAndRightToLeft));

        let no = RawMetadata::ComicInfo(ComicInfo {
            black_and_white: Some("No".to_string()),
            ..ComicInfo::default()
        });
        let result = standardizer
            .standardize(Some(&no), &file_props(), &folder_props())
            .unwrap();
        assert_eq!(result.black_and_white, Some(false));
        assert_eq!(result.manga, None);

        let garbage = RawMetadata::ComicInfo(ComicInfo {
            black_and_white: Some("Maybe".to_string()),
            ..ComicInfo::default()
        });
        let result = standardizer
            .standardize(Some(&garbage), &file_props(), &folder_props())
            .unwrap();
        assert_eq!(result.black_and_white, None);
    }

    #[test]
    fn test_comic_book_info_standardizes_to_same_shape() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicBookInfo(ComicBookInfo {
            series: Some("Watchmen".to_string()),
            issue: Some(serde_json::json!(3)),
            publication_year: Some(1986),
            credits: vec![
                crate::domain::metadata::CreditEntry {
                    person: Some("Alan Moore".to_string()),
                    role: Some("Writer".to_string()),
                    primary: Some(true),
                },
                crate::domain::metadata::CreditEntry {
                    person: Some("Dave Gibbons".to_string()),
                    role: Some("Penciller".to_string()),
                    primary: None,
                },
            ],
            ..ComicBookInfo::default()
        });

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        assert_eq!(result.series, "Watchmen");
        assert_eq!(result.number, "3");
        assert_eq!(result.year, "1986");
        assert_eq!(result.writers, vec!["Alan Moore".to_string()]);
        assert_eq!(result.pencillers, vec!["Dave Gibbons".to_string()]);

        // The lean format cannot express a reading direction
        assert_eq!(result.manga, None);
        assert_eq!(result.black_and_white, None);
    }

    #[test]
    fn test_comic_book_info_string_issue() {
        let standardizer = MetadataStandardizer::new();
        let raw = RawMetadata::ComicBookInfo(ComicBookInfo {
            issue: Some(serde_json::json!("Annual 1")),
            ..ComicBookInfo::default()
        });

        let result = standardizer
            .standardize(Some(&raw), &file_props(), &folder_props())
            .unwrap();

        assert_eq!(result.number, "Annual 1");
    }
}
