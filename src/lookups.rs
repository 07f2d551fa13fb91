//! Read-only lookup tables consulted by the pipeline.
//!
//! - [`Crosswalk`]: regional storm ids (ATCF style, e.g. `AL092005`) to
//!   IBTrACS serial ids, parsed from the IBTrACS name mapping file.
//! - [`ReportIndex`]: "NAME YEAR" to storm report URL.
//! - [`Lookups`]: the tables above plus the ENSO phase lookup, passed to the
//!   pipeline as one value.

use crate::climate::ClimateLookup;
use crate::error::{Result, TrackError};
use csv::StringRecord;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::debug;

static ATCF_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^b?([a-z]{2}\d{6})$").expect("ATCF key pattern is valid")
});

static ATCF_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"b[a-z]{2}\d{6}").expect("ATCF token pattern is valid"));

const REPORT_NAME_PREFIXES: &[&str] = &[
    "Hurricane ",
    "Tropical Storm ",
    "Tropical Depression ",
    "Subtropical Storm ",
];

const REPORT_NAME_SUFFIXES: &[&str] = &[" (Atlantic)", " (Pacific)"];

/// Normalize a storm id for crosswalk lookup: lowercase, ATCF `b` prefix removed
pub fn normalize_key(key: &str) -> String {
    let lowered = key.trim().to_lowercase();
    match ATCF_KEY.captures(&lowered) {
        Some(captures) => captures[1].to_string(),
        None => lowered,
    }
}

/// Mapping from source-specific storm ids to canonical ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Crosswalk {
    entries: HashMap<String, String>,
}

impl Crosswalk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, canonical_id: impl Into<String>) {
        self.entries.insert(normalize_key(key), canonical_id.into());
    }

    /// Parse the IBTrACS name mapping text.
    ///
    /// Lines mentioning `hurdat` map their second token to the first; lines
    /// mentioning `multiple` map every ATCF id found in the line.
    pub fn parse(text: &str) -> Self {
        let mut crosswalk = Self::new();

        for line in text.lines() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let Some(canonical_id) = tokens.first() else {
                continue;
            };

            if line.contains("multiple") {
                for token in tokens.iter().filter(|token| token.contains("atcf")) {
                    for found in ATCF_TOKEN.find_iter(&token.to_lowercase()) {
                        crosswalk.insert(found.as_str(), *canonical_id);
                    }
                }
            } else if line.contains("hurdat") {
                if let Some(key) = tokens.get(1) {
                    crosswalk.insert(key, *canonical_id);
                }
            }
        }

        debug!("Loaded {} crosswalk entries", crosswalk.len());
        crosswalk
    }

    /// Canonical id for a source id, if mapped
    pub fn canonical_id(&self, source_id: &str) -> Option<&str> {
        self.entries
            .get(&normalize_key(source_id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Clean an NHC report title into the "NAME" part of a report key
pub fn clean_report_name(title: &str) -> String {
    let mut name = title.trim().to_string();
    for prefix in REPORT_NAME_PREFIXES {
        name = name.replace(prefix, "");
    }
    for suffix in REPORT_NAME_SUFFIXES {
        name = name.replace(suffix, "");
    }
    name.trim().to_uppercase()
}

/// Report URLs keyed by upper-case "NAME YEAR"
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportIndex {
    urls: HashMap<String, String>,
}

impl ReportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, title: &str, year: &str, url: impl Into<String>) {
        let key = format!("{} {}", clean_report_name(title), year.trim());
        self.urls.insert(key, url.into());
    }

    /// Parse `name,year,url` CSV rows; rows without all three fields are ignored
    pub fn parse(text: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut record = StringRecord::new();
        let mut index = Self::new();

        while reader.read_record(&mut record).map_err(|e| {
            TrackError::csv_parsing("report index", "Failed to read CSV record", Some(e))
        })? {
            if let (Some(title), Some(year), Some(url)) =
                (record.get(0), record.get(1), record.get(2))
            {
                let url = url.trim();
                if !title.trim().is_empty() && !url.is_empty() {
                    index.insert(title, year, url);
                }
            }
        }
        debug!("Loaded {} storm report links", index.len());
        Ok(index)
    }

    /// Report URL for a storm name and genesis year
    pub fn url_for(&self, name: &str, year: i32) -> Option<&str> {
        self.urls
            .get(&format!("{} {}", name.trim().to_uppercase(), year))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Read-only collaborators of the pipeline
#[derive(Debug, Clone, Default)]
pub struct Lookups {
    pub climate: ClimateLookup,
    pub reports: ReportIndex,
    /// Without a crosswalk, deduplication falls back to name matching
    pub crosswalk: Option<Crosswalk>,
}

impl Lookups {
    pub fn new(climate: ClimateLookup) -> Self {
        Self {
            climate,
            ..Default::default()
        }
    }

    pub fn with_reports(mut self, reports: ReportIndex) -> Self {
        self.reports = reports;
        self
    }

    pub fn with_crosswalk(mut self, crosswalk: Crosswalk) -> Self {
        self.crosswalk = Some(crosswalk);
        self
    }
}
