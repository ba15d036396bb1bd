// src/domain/metadata/raw.rs
//
// Embedded metadata as read out of a comic archive, before standardization.
//
// Two source formats are supported:
// - ComicInfo.xml (the richer format, one XML document per archive)
// - ComicBookInfo (a leaner JSON document stored in the ZIP archive comment)
//
// Fields mirror the source documents; interpretation (tri-state flags,
// comma-separated creator lists, merge precedence) happens in the
// standardizer, not here.

use serde::{Deserialize, Serialize};

/// Embedded metadata in whichever source format the archive carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RawMetadata {
    ComicInfo(ComicInfo),
    ComicBookInfo(ComicBookInfo),
}

impl RawMetadata {
    pub fn format_name(&self) -> &'static str {
        match self {
            RawMetadata::ComicInfo(_) => "ComicInfo.xml",
            RawMetadata::ComicBookInfo(_) => "ComicBookInfo",
        }
    }
}

/// The ComicInfo.xml document shape.
///
/// Creator fields hold the raw comma-separated strings from the document.
/// `black_and_white` and `manga` keep their raw Yes/No values; `manga`
/// additionally allows "YesAndRightToLeft".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComicInfo {
    pub title: Option<String>,
    pub series: Option<String>,
    pub number: Option<String>,
    pub count: Option<i64>,
    pub volume: Option<String>,
    pub summary: Option<String>,
    pub notes: Option<String>,
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub day: Option<i64>,
    pub writer: Option<String>,
    pub penciller: Option<String>,
    pub inker: Option<String>,
    pub colorist: Option<String>,
    pub letterer: Option<String>,
    pub cover_artist: Option<String>,
    pub editor: Option<String>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub genre: Option<String>,
    pub web: Option<String>,
    pub page_count: Option<i64>,
    pub language_iso: Option<String>,
    pub format: Option<String>,
    pub black_and_white: Option<String>,
    pub manga: Option<String>,
    pub characters: Option<String>,
    pub teams: Option<String>,
    pub locations: Option<String>,
    pub scan_information: Option<String>,
    pub story_arc: Option<String>,
    pub series_group: Option<String>,
    pub age_rating: Option<String>,
    pub community_rating: Option<f64>,
    pub pages: Vec<RawPage>,
}

/// A single `<Page>` element from ComicInfo.xml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPage {
    pub image: Option<i64>,
    pub page_type: Option<String>,
    pub double_page: bool,
}

/// The ComicBookInfo JSON document shape (the leaner format).
///
/// `issue` and `volume` are left as raw JSON values: real-world documents
/// store them as either numbers or strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComicBookInfo {
    pub series: Option<String>,
    pub title: Option<String>,
    pub publisher: Option<String>,
    #[serde(rename = "publicationMonth")]
    pub publication_month: Option<i64>,
    #[serde(rename = "publicationYear")]
    pub publication_year: Option<i64>,
    pub issue: Option<serde_json::Value>,
    #[serde(rename = "numberOfIssues")]
    pub number_of_issues: Option<i64>,
    pub volume: Option<serde_json::Value>,
    #[serde(rename = "numberOfVolumes")]
    pub number_of_volumes: Option<i64>,
    pub rating: Option<f64>,
    pub genre: Option<String>,
    pub language: Option<String>,
    pub country: Option<String>,
    pub credits: Vec<CreditEntry>,
    pub tags: Vec<String>,
    pub comments: Option<String>,
}

/// One entry of the ComicBookInfo `credits` array
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreditEntry {
    pub person: Option<String>,
    pub role: Option<String>,
    pub primary: Option<bool>,
}
