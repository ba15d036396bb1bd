// src/domain/metadata/standardized.rs
//
// The canonical comic metadata record, independent of which embedded
// format it came from. Produced once per file by merging embedded metadata
// over name-derived fallbacks; a field-present embedded value always wins.

use serde::{Deserialize, Serialize};

/// Reading-direction flag from the richer embedded format.
///
/// The leaner format has no equivalent concept, so standardization leaves
/// the field absent rather than guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MangaMode {
    Yes,
    No,
    YesAndRightToLeft,
}

/// A single page entry from embedded metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub image: u32,
    pub page_type: String,
    pub double_page: bool,
}

/// Canonical, merged comic metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardizedMetadata {
    pub title: String,
    pub series: String,
    pub number: String,
    pub volume: String,
    pub count: Option<u32>,
    pub publisher: String,
    pub imprint: String,

    pub year: String,
    pub month: Option<u32>,
    pub day: Option<u32>,

    // Creator-role lists, split from comma-separated source strings
    pub writers: Vec<String>,
    pub pencillers: Vec<String>,
    pub inkers: Vec<String>,
    pub colorists: Vec<String>,
    pub letterers: Vec<String>,
    pub editors: Vec<String>,
    pub cover_artists: Vec<String>,

    pub summary: String,
    pub genre: String,
    pub web: String,
    pub page_count: Option<u32>,
    pub language: String,
    pub format: String,

    /// Tri-state Yes/No/unset source flag mapped to true/false/absent
    pub black_and_white: Option<bool>,

    /// Richer format only; absent for the leaner format
    pub manga: Option<MangaMode>,

    pub characters: Vec<String>,
    pub teams: Vec<String>,
    pub locations: Vec<String>,

    pub story_arc: String,
    pub series_group: String,
    pub age_rating: String,
    pub community_rating: Option<f64>,

    pub tags: Vec<String>,
    pub pages: Vec<PageInfo>,
}
