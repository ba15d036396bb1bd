// src/infrastructure/archive_metadata.rs
//
// Embedded metadata extraction from comic archives.
//
// Only ZIP-based archives (.cbz) are readable here: ComicInfo.xml as an
// archive entry, or a ComicBookInfo JSON document in the ZIP comment.
// Other containers (.cbr/.cb7/.cbt) yield None and the pipeline proceeds
// on name-derived data alone. This is deliberately not a general-purpose
// archive reader; only the two metadata documents are touched.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

use crate::domain::metadata::{ComicBookInfo, ComicInfo, RawMetadata, RawPage};
use crate::error::{AppError, AppResult};

/// Archive-format-specific metadata access, consumed as an opaque contract
/// by the ingestion pipeline.
#[cfg_attr(test, mockall::automock)]
pub trait MetadataReader: Send + Sync {
    /// Read embedded metadata from the archive at `path`.
    ///
    /// `Ok(None)` means the archive carries no readable metadata; an error
    /// means the archive exists but could not be read (corrupt, truncated).
    fn read_embedded(&self, path: &Path) -> AppResult<Option<RawMetadata>>;
}

#[derive(Debug, Default)]
pub struct ZipMetadataReader;

impl ZipMetadataReader {
    pub fn new() -> Self {
        Self
    }
}

impl MetadataReader for ZipMetadataReader {
    fn read_embedded(&self, path: &Path) -> AppResult<Option<RawMetadata>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        if extension.as_deref() != Some("cbz") {
            return Ok(None);
        }

        let file = File::open(path).map_err(AppError::Io)?;
        let mut archive = ZipArchive::new(file)?;

        // The richer format: a ComicInfo.xml entry, usually at the root
        let entry_name = archive
            .file_names()
            .find(|name| {
                let lower = name.to_ascii_lowercase();
                lower == "comicinfo.xml" || lower.ends_with("/comicinfo.xml")
            })
            .map(|name| name.to_string());

        if let Some(name) = entry_name {
            let mut xml = String::new();
            archive
                .by_name(&name)?
                .read_to_string(&mut xml)
                .map_err(AppError::Io)?;

            let info = parse_comic_info(&xml)?;
            return Ok(Some(RawMetadata::ComicInfo(info)));
        }

        // The leaner format: ComicBookInfo JSON in the archive comment
        let comment = archive.comment();
        if !comment.is_empty() {
            if let Some(info) = parse_comic_book_info(comment) {
                return Ok(Some(RawMetadata::ComicBookInfo(info)));
            }
        }

        Ok(None)
    }
}

/// Pull-parse a ComicInfo.xml document into its raw field set.
fn parse_comic_info(xml: &str) -> AppResult<ComicInfo> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut info = ComicInfo::default();
    let mut current: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if name == "Page" {
                    info.pages.push(page_from_attributes(&e));
                }
                current = Some(name);
            }
            Ok(Event::Empty(e)) => {
                if e.name().as_ref() == b"Page" {
                    info.pages.push(page_from_attributes(&e));
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default();
                let text = text.trim();
                if !text.is_empty() {
                    if let Some(tag) = current.as_deref() {
                        assign_comic_info_field(&mut info, tag, text);
                    }
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AppError::Metadata(format!(
                    "ComicInfo.xml parse error: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(info)
}

fn assign_comic_info_field(info: &mut ComicInfo, tag: &str, text: &str) {
    let value = text.to_string();
    match tag {
        "Title" => info.title = Some(value),
        "Series" => info.series = Some(value),
        "Number" => info.number = Some(value),
        "Count" => info.count = text.parse().ok(),
        "Volume" => info.volume = Some(value),
        "Summary" => info.summary = Some(value),
        "Notes" => info.notes = Some(value),
        "Year" => info.year = text.parse().ok(),
        "Month" => info.month = text.parse().ok(),
        "Day" => info.day = text.parse().ok(),
        "Writer" => info.writer = Some(value),
        "Penciller" => info.penciller = Some(value),
        "Inker" => info.inker = Some(value),
        "Colorist" => info.colorist = Some(value),
        "Letterer" => info.letterer = Some(value),
        "CoverArtist" => info.cover_artist = Some(value),
        "Editor" => info.editor = Some(value),
        "Publisher" => info.publisher = Some(value),
        "Imprint" => info.imprint = Some(value),
        "Genre" => info.genre = Some(value),
        "Web" => info.web = Some(value),
        "PageCount" => info.page_count = text.parse().ok(),
        "LanguageISO" => info.language_iso = Some(value),
        "Format" => info.format = Some(value),
        "BlackAndWhite" => info.black_and_white = Some(value),
        "Manga" => info.manga = Some(value),
        "Characters" => info.characters = Some(value),
        "Teams" => info.teams = Some(value),
        "Locations" => info.locations = Some(value),
        "ScanInformation" => info.scan_information = Some(value),
        "StoryArc" => info.story_arc = Some(value),
        "SeriesGroup" => info.series_group = Some(value),
        "AgeRating" => info.age_rating = Some(value),
        "CommunityRating" => info.community_rating = text.parse().ok(),
        _ => {}
    }
}

fn page_from_attributes(element: &BytesStart) -> RawPage {
    let mut page = RawPage::default();

    for attr in element.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"Image" => page.image = value.parse().ok(),
            b"Type" => page.page_type = Some(value),
            b"DoublePage" => page.double_page = value.eq_ignore_ascii_case("true"),
            _ => {}
        }
    }

    page
}

/// The ComicBookInfo document wraps its payload under a versioned key:
/// `{"appID": "...", "ComicBookInfo/1.0": {...}}`
fn parse_comic_book_info(comment: &[u8]) -> Option<ComicBookInfo> {
    let value: serde_json::Value = serde_json::from_slice(comment).ok()?;
    let payload = value.get("ComicBookInfo/1.0")?;
    serde_json::from_value(payload.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;

    const COMIC_INFO_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<ComicInfo>
  <Title>The Court of Owls</Title>
  <Series>Batman</Series>
  <Number>1</Number>
  <Volume>2</Volume>
  <Year>2011</Year>
  <Month>11</Month>
  <Writer>Scott Snyder</Writer>
  <Penciller>Greg Capullo</Penciller>
  <Publisher>DC Comics</Publisher>
  <PageCount>32</PageCount>
  <BlackAndWhite>No</BlackAndWhite>
  <Manga>No</Manga>
  <Pages>
    <Page Image="0" Type="FrontCover" />
    <Page Image="1" DoublePage="true" />
  </Pages>
</ComicInfo>"#;

    fn write_cbz_with_comic_info(dir: &Path) -> PathBuf {
        let path = dir.join("Batman 001 (2011).cbz");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        writer.start_file("ComicInfo.xml", options).unwrap();
        writer.write_all(COMIC_INFO_XML.as_bytes()).unwrap();
        writer.start_file("page00.jpg", options).unwrap();
        writer.write_all(b"not really a jpeg").unwrap();
        writer.finish().unwrap();

        path
    }

    fn write_cbz_with_comment(dir: &Path) -> PathBuf {
        let path = dir.join("Watchmen 003 (1986).cbz");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        writer.start_file("page00.jpg", options).unwrap();
        writer.write_all(b"not really a jpeg").unwrap();
        writer.set_comment(
            r#"{"appID":"comichub","ComicBookInfo/1.0":{"series":"Watchmen","issue":3,"publicationYear":1986,"credits":[{"person":"Alan Moore","role":"Writer"}]}}"#
                .to_string(),
        );
        writer.finish().unwrap();

        path
    }

    #[test]
    fn test_reads_comic_info_xml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cbz_with_comic_info(dir.path());

        let reader = ZipMetadataReader::new();
        let raw = reader.read_embedded(&path).unwrap().expect("metadata");

        let RawMetadata::ComicInfo(info) = raw else {
            panic!("expected the ComicInfo variant");
        };

        assert_eq!(info.title.as_deref(), Some("The Court of Owls"));
        assert_eq!(info.series.as_deref(), Some("Batman"));
        assert_eq!(info.number.as_deref(), Some("1"));
        assert_eq!(info.year, Some(2011));
        assert_eq!(info.writer.as_deref(), Some("Scott Snyder"));
        assert_eq!(info.black_and_white.as_deref(), Some("No"));
        assert_eq!(info.pages.len(), 2);
        assert_eq!(info.pages[0].page_type.as_deref(), Some("FrontCover"));
        assert!(info.pages[1].double_page);
    }

    #[test]
    fn test_reads_comic_book_info_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cbz_with_comment(dir.path());

        let reader = ZipMetadataReader::new();
        let raw = reader.read_embedded(&path).unwrap().expect("metadata");

        let RawMetadata::ComicBookInfo(info) = raw else {
            panic!("expected the ComicBookInfo variant");
        };

        assert_eq!(info.series.as_deref(), Some("Watchmen"));
        assert_eq!(info.publication_year, Some(1986));
        assert_eq!(info.credits.len(), 1);
    }

    #[test]
    fn test_archive_without_metadata_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.cbz");
        let file = File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("page00.jpg", options).unwrap();
        writer.write_all(b"pixels").unwrap();
        writer.finish().unwrap();

        let reader = ZipMetadataReader::new();
        assert!(reader.read_embedded(&path).unwrap().is_none());
    }

    #[test]
    fn test_non_zip_container_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.cbr");
        std::fs::write(&path, b"Rar!").unwrap();

        let reader = ZipMetadataReader::new();
        assert!(reader.read_embedded(&path).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let reader = ZipMetadataReader::new();
        assert!(reader.read_embedded(&path).is_err());
    }
}
