//! Core data structures and types for cyclone track processing.
//!
//! Defines archive sources, observations, segments, storms, intensity
//! categories, climate phases and the QA counters gathered by the pipeline.

use crate::constants::{MISSING_VALUE, PHASE_KEY_FORMAT};
use crate::error::{Result, TrackError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Best-track archives a storm can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Source {
    /// IBTrACS global multi-agency archive
    Ibtracs,
    /// HURDAT2 North Atlantic archive
    HurdatAtlantic,
    /// HURDAT2 North-East Pacific archive
    HurdatPacific,
}

impl Source {
    /// Regional archives are the HURDAT2 basins
    pub fn is_regional(&self) -> bool {
        matches!(self, Source::HurdatAtlantic | Source::HurdatPacific)
    }

    /// Ordering used to break ties when sorting storms
    pub fn rank(&self) -> u8 {
        match self {
            Source::Ibtracs => 0,
            Source::HurdatAtlantic => 1,
            Source::HurdatPacific => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Ibtracs => "ibtracs",
            Source::HurdatAtlantic => "hurdat2-atlantic",
            Source::HurdatPacific => "hurdat2-nepac",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intensity class of a single observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    NotRated,
    TropicalDepression,
    TropicalStorm,
    H1,
    H2,
    H3,
    H4,
    H5,
    Extratropical,
}

impl Category {
    /// Two-letter legend code
    pub fn code(&self) -> &'static str {
        match self {
            Category::NotRated => "NR",
            Category::TropicalDepression => "TD",
            Category::TropicalStorm => "TS",
            Category::H1 => "H1",
            Category::H2 => "H2",
            Category::H3 => "H3",
            Category::H4 => "H4",
            Category::H5 => "H5",
            Category::Extratropical => "ET",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// ENSO phase of a calendar month
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClimatePhase {
    Warm,
    Cold,
    Neutral,
    #[default]
    Unknown,
}

impl ClimatePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClimatePhase::Warm => "warm",
            ClimatePhase::Cold => "cold",
            ClimatePhase::Neutral => "neutral",
            ClimatePhase::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ClimatePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar distance in degrees
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        ((other.lat - self.lat).powi(2) + (other.lon - self.lon).powi(2)).sqrt()
    }
}

/// One best-track fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub time: DateTime<Utc>,
    pub lat: f64,
    pub lon: f64,
    /// Knots, [`MISSING_VALUE`] when absent
    pub wind: f64,
    /// hPa, [`MISSING_VALUE`] when absent
    pub pressure: f64,
    pub nature: String,
}

impl Observation {
    pub fn position(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lon)
    }

    pub fn has_wind(&self) -> bool {
        self.wind >= 0.0
    }

    pub fn has_pressure(&self) -> bool {
        self.pressure > 0.0
    }

    /// "YYYY-MM" key of the observation month
    pub fn month_key(&self) -> String {
        self.time.format(PHASE_KEY_FORMAT).to_string()
    }
}

/// An observation plus the fields derived from it in later stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub observation: Observation,
    pub end: Option<Coordinate>,
    pub category: Option<Category>,
    pub phase: Option<ClimatePhase>,
}

impl Segment {
    pub fn new(observation: Observation) -> Self {
        Self {
            observation,
            end: None,
            category: None,
            phase: None,
        }
    }

    pub fn start(&self) -> Coordinate {
        self.observation.position()
    }
}

/// A storm as assembled from one archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Storm {
    /// Identifier as found in the source archive
    pub source_id: String,
    /// Cross-source identifier, the source id unless a crosswalk maps it
    pub canonical_id: String,
    /// Name as found in the source archive
    pub name: String,
    /// Name with genesis year and optional provisional marker
    pub display_name: String,
    pub basin: String,
    pub source: Source,
    pub provisional: bool,
    pub segments: Vec<Segment>,
    pub segment_count: usize,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub max_wind: f64,
    pub min_pressure: f64,
    pub max_category: Category,
    pub genesis_phase: ClimatePhase,
}

impl Storm {
    /// Whether any segment carries a usable wind or pressure value
    pub fn has_intensity_data(&self) -> bool {
        self.max_wind >= 0.0 || self.min_pressure > 0.0
    }

    /// Key under which duplicates are detected
    pub fn identity(&self) -> (&str, &str) {
        (&self.canonical_id, &self.basin)
    }
}

/// Default aggregate values before classification
pub(crate) fn unset_aggregates() -> (f64, f64, Category, ClimatePhase) {
    (
        MISSING_VALUE,
        MISSING_VALUE,
        Category::NotRated,
        ClimatePhase::Unknown,
    )
}

/// QA counters gathered across one run
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingStats {
    pub sources_processed: usize,
    /// Storms read from IBTrACS, provisional omissions excluded
    pub ibtracs_storms: usize,
    pub hurdat_atlantic_storms: usize,
    pub hurdat_pacific_storms: usize,
    pub provisional_omitted: usize,
    pub coordinate_errors: usize,
    pub timestamp_errors: usize,
    pub off_synoptic_dropped: usize,
    pub count_mismatches: usize,
    pub single_point_storms: usize,
    pub multi_observation_storms: usize,
    pub duplicates_resolved: usize,
    pub unique_storms: usize,
    pub storms_without_intensity: usize,
    pub good_storms: usize,
    pub antimeridian_crossings: usize,
    pub degenerate_nudges: usize,
    pub projection_errors: usize,
    pub segments_emitted: usize,
    pub tracks_emitted: usize,
    pub processing_time_ms: u128,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storms entering the length check
    pub fn storms_ingested(&self) -> usize {
        self.ibtracs_storms + self.hurdat_atlantic_storms + self.hurdat_pacific_storms
    }

    pub fn record_errors(&self) -> usize {
        self.coordinate_errors + self.timestamp_errors
    }

    /// Check every conservation identity between the stage counters
    pub fn verify(&self) -> Result<()> {
        check(
            "single-point + multi-observation storms == storms ingested",
            self.storms_ingested(),
            self.single_point_storms + self.multi_observation_storms,
        )?;
        check(
            "unique + duplicate storms == multi-observation storms",
            self.multi_observation_storms,
            self.unique_storms + self.duplicates_resolved,
        )?;
        check(
            "storms without intensity + good storms == unique storms",
            self.unique_storms,
            self.storms_without_intensity + self.good_storms,
        )
    }

    /// Get summary of the QA counters
    pub fn summary(&self) -> String {
        format!(
            "Ingested {} storms ({} IBTrACS, {} Atlantic, {} NE Pacific) | \
             single-point: {} | duplicates: {} | unique: {} | \
             no intensity: {} | record errors: {} | projection errors: {}",
            self.storms_ingested(),
            self.ibtracs_storms,
            self.hurdat_atlantic_storms,
            self.hurdat_pacific_storms,
            self.single_point_storms,
            self.duplicates_resolved,
            self.unique_storms,
            self.storms_without_intensity,
            self.record_errors(),
            self.projection_errors
        )
    }
}

fn check(name: &str, expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(TrackError::QaCheckFailed {
            check: name.to_string(),
            expected,
            found,
        })
    }
}
