// src/services/name_parser.rs
//
// Heuristic comic file/folder name parsing.
//
// CRITICAL RULES:
// - Pure and deterministic: no I/O, same input → same output
// - Extraction is an ordered list of steps over an explicit working
//   string; each step returns the residue plus the extracted field
// - Absence of a pattern yields an empty field, never an error
// - Ambiguity is resolved by step order, not cleverness

use regex::Regex;

use crate::domain::naming::{ParsedFileProps, ParsedFolderProps};

pub struct NameParser {
    /// "11 (of 12)" limited-run issue marker
    limited_run: Regex,

    /// "(2011)" four-digit year group
    paren_year: Regex,

    /// Any "(...)" group; tag source for file names
    paren_group: Regex,

    /// "v1" volume marker in file names
    file_volume: Regex,

    /// Trailing run of 1-4 digits, the fallback issue number
    trailing_issue: Regex,

    /// Any "[...]" group; tag source for folder names
    bracket_group: Regex,

    /// "v4", "vol 2", "vol. 2", "volume 2" in folder names
    folder_volume: Regex,

    /// Bare " - 2011" or trailing " 2011" year suffix in folder names
    bare_year: Regex,
}

impl Default for NameParser {
    fn default() -> Self {
        Self {
            limited_run: Regex::new(r"(\d+)\s*\(of\s+\d+\)").unwrap(),
            paren_year: Regex::new(r"\((\d{4})\)").unwrap(),
            paren_group: Regex::new(r"\(([^)]*)\)").unwrap(),
            file_volume: Regex::new(r"(?i)\bv(\d+)\b").unwrap(),
            trailing_issue: Regex::new(r"(?:^|[^\d])(\d{1,4})\s*$").unwrap(),
            bracket_group: Regex::new(r"\[([^\]]*)\]").unwrap(),
            folder_volume: Regex::new(r"(?i)\b(?:vol(?:ume)?\.?\s+|v)(\d+)\b").unwrap(),
            bare_year: Regex::new(r"(?:\s-\s|\s)(\d{4})\s*$").unwrap(),
        }
    }
}

impl NameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comic archive file name.
    ///
    /// Step order matters; later steps operate on the residue of earlier
    /// ones:
    /// 1. strip the extension
    /// 2. limited-run issue marker "11 (of 12)"
    /// 3. first "(YYYY)" year group
    /// 4. remaining "(...)" groups become tags (year-valued groups excluded)
    /// 5. "v1" volume marker
    /// 6. trailing digit run as issue number, if step 2 found none
    /// 7. the trimmed residue is the series name
    pub fn parse_file_name(&self, filename: &str) -> ParsedFileProps {
        let working = strip_extension(filename);
        let (working, limited_issue) = self.extract_limited_run(&working);
        let (working, year) = self.extract_paren_year(&working);
        let (working, tags) = self.extract_paren_tags(&working, &year);
        let (working, volume) = self.extract_file_volume(&working);
        let (working, issue) = if limited_issue.is_empty() {
            self.extract_trailing_issue(&working)
        } else {
            (working, limited_issue)
        };

        ParsedFileProps {
            series_name: working.trim().to_string(),
            issue_number: issue,
            volume_number: volume,
            year,
            tags,
        }
    }

    /// Parse a series folder name.
    ///
    /// Same philosophy, different grammar: tags are bracket-delimited,
    /// the year also matches a bare " - YYYY" or trailing " YYYY" suffix,
    /// and the volume marker allows the "vol."/"volume" spellings.
    pub fn parse_folder_name(&self, foldername: &str) -> ParsedFolderProps {
        let (working, tags) = self.extract_bracket_tags(foldername);
        let (working, year) = self.extract_folder_year(&working);
        let (working, volume) = self.extract_folder_volume(&working);

        ParsedFolderProps {
            series_name: working.trim().to_string(),
            series_year: year,
            series_volume: volume,
            series_tags: tags,
        }
    }

    // ------------------------------------------------------------------
    // Extraction steps: each returns (residue, extracted)
    // ------------------------------------------------------------------

    fn extract_limited_run(&self, name: &str) -> (String, String) {
        match self.limited_run.captures(name) {
            Some(caps) => {
                let whole = caps.get(0).unwrap();
                let digits = caps.get(1).unwrap().as_str();
                (
                    remove_span(name, whole.start(), whole.end()),
                    strip_leading_zeros(digits),
                )
            }
            None => (name.to_string(), String::new()),
        }
    }

    fn extract_paren_year(&self, name: &str) -> (String, String) {
        match self.paren_year.captures(name) {
            Some(caps) => {
                let whole = caps.get(0).unwrap();
                let year = caps.get(1).unwrap().as_str().to_string();
                (remove_span(name, whole.start(), whole.end()), year)
            }
            None => (name.to_string(), String::new()),
        }
    }

    /// Collect every remaining "(...)" group as a tag, preserving
    /// left-to-right order and raw casing. A group whose content exactly
    /// equals the extracted year is a duplicate year marker, not a tag.
    fn extract_paren_tags(&self, name: &str, year: &str) -> (String, Vec<String>) {
        let tags = self
            .paren_group
            .captures_iter(name)
            .map(|caps| caps.get(1).unwrap().as_str().to_string())
            .filter(|content| year.is_empty() || content != year)
            .collect();

        let residue = self.paren_group.replace_all(name, "").to_string();
        (residue, tags)
    }

    fn extract_file_volume(&self, name: &str) -> (String, String) {
        match self.file_volume.captures(name) {
            Some(caps) => {
                let whole = caps.get(0).unwrap();
                let digits = caps.get(1).unwrap().as_str().to_string();
                (remove_span(name, whole.start(), whole.end()), digits)
            }
            None => (name.to_string(), String::new()),
        }
    }

    fn extract_trailing_issue(&self, name: &str) -> (String, String) {
        match self.trailing_issue.captures(name) {
            Some(caps) => {
                let digits = caps.get(1).unwrap();
                let issue = strip_leading_zeros(digits.as_str());
                (remove_span(name, digits.start(), digits.end()), issue)
            }
            None => (name.to_string(), String::new()),
        }
    }

    fn extract_bracket_tags(&self, name: &str) -> (String, Vec<String>) {
        let tags = self
            .bracket_group
            .captures_iter(name)
            .map(|caps| caps.get(1).unwrap().as_str().to_string())
            .collect();

        let residue = self.bracket_group.replace_all(name, "").to_string();
        (residue, tags)
    }

    fn extract_folder_year(&self, name: &str) -> (String, String) {
        if let Some(caps) = self.paren_year.captures(name) {
            let whole = caps.get(0).unwrap();
            let year = caps.get(1).unwrap().as_str().to_string();
            return (remove_span(name, whole.start(), whole.end()), year);
        }

        if let Some(caps) = self.bare_year.captures(name) {
            let whole = caps.get(0).unwrap();
            let year = caps.get(1).unwrap().as_str().to_string();
            return (remove_span(name, whole.start(), whole.end()), year);
        }

        (name.to_string(), String::new())
    }

    fn extract_folder_volume(&self, name: &str) -> (String, String) {
        match self.folder_volume.captures(name) {
            Some(caps) => {
                let whole = caps.get(0).unwrap();
                let digits = caps.get(1).unwrap().as_str().to_string();
                (remove_span(name, whole.start(), whole.end()), digits)
            }
            None => (name.to_string(), String::new()),
        }
    }
}

// ----------------------------------------------------------------------
// Pure string helpers
// ----------------------------------------------------------------------

fn strip_extension(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

fn remove_span(name: &str, start: usize, end: usize) -> String {
    let mut residue = String::with_capacity(name.len());
    residue.push_str(&name[..start]);
    residue.push_str(&name[end..]);
    residue
}

fn strip_leading_zeros(digits: &str) -> String {
    let stripped = digits.trim_start_matches('0');
    if stripped.is_empty() {
        "0".to_string()
    } else {
        stripped.to_string()
    }
}
