//! Best-track format parsers.
//!
//! Each parser turns the full text of one archive into storm records in
//! file order, counting the records it had to skip.

pub mod hurdat;
pub mod ibtracs;

pub use hurdat::HurdatParser;
pub use ibtracs::IbtracsParser;

use crate::constants::MISSING_VALUE;
use crate::error::Result;
use crate::models::{Observation, Source};
use std::ops::AddAssign;

/// Storm header as declared by the source
#[derive(Debug, Clone, PartialEq)]
pub struct StormHeader {
    pub id: String,
    pub name: String,
    pub basin: String,
    pub source: Source,
    /// Observation count announced by a HURDAT2 header line
    pub declared_count: Option<usize>,
    pub provisional: bool,
}

/// A storm header and the observations read for it
#[derive(Debug, Clone, PartialEq)]
pub struct StormRecord {
    pub header: StormHeader,
    pub observations: Vec<Observation>,
}

/// Records skipped while parsing one source
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseStats {
    pub coordinate_errors: usize,
    pub timestamp_errors: usize,
    pub off_synoptic_dropped: usize,
}

impl AddAssign for ParseStats {
    fn add_assign(&mut self, other: Self) {
        self.coordinate_errors += other.coordinate_errors;
        self.timestamp_errors += other.timestamp_errors;
        self.off_synoptic_dropped += other.off_synoptic_dropped;
    }
}

/// Output of parsing one source
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    pub source: Source,
    pub storms: Vec<StormRecord>,
    pub stats: ParseStats,
}

/// Common interface of the archive parsers
pub trait TrackParser: Send + Sync {
    fn source(&self) -> Source;

    /// Parse the complete text of a source file
    fn parse(&self, text: &str) -> Result<ParsedSource>;
}

/// Parse a wind or pressure field; blank, unparseable and negative values are missing
pub(crate) fn parse_measurement(field: &str) -> f64 {
    match field.trim().parse::<f64>() {
        Ok(value) if value >= 0.0 && value.is_finite() => value,
        _ => MISSING_VALUE,
    }
}
