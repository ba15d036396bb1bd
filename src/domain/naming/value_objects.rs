// src/domain/naming/value_objects.rs
//
// Value objects produced by the name parser.
//
// These are derived, ephemeral values: recomputed per file, never persisted
// directly. Absent fields are empty strings or empty lists, never errors.

use serde::{Deserialize, Serialize};

/// Properties extracted from a comic archive file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFileProps {
    /// Residual series title after all other extractions
    pub series_name: String,

    /// Issue number with leading zeros stripped
    pub issue_number: String,

    /// Volume marker digits ("1" from "v1")
    pub volume_number: String,

    /// Four-digit publication year
    pub year: String,

    /// Parenthesised release tags, left-to-right, raw casing
    pub tags: Vec<String>,
}

/// Properties extracted from the parent folder name of a comic file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedFolderProps {
    pub series_name: String,
    pub series_year: String,
    pub series_volume: String,

    /// Bracket-delimited tags, left-to-right, raw casing
    pub series_tags: Vec<String>,
}
