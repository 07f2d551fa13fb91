//! Error handling for cyclone track processing.
//!
//! Distinguishes record-level failures (a single malformed observation,
//! an unprojectable coordinate) that the pipeline counts and skips from
//! source-level failures that abort the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Source file not found at path: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Invalid {source_name} format at line {line}: {reason}")]
    InvalidFormat {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("CSV parsing error in {source_name}: {message}")]
    CsvParsing {
        source_name: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    #[error("Unrecognized hemisphere in coordinate '{value}'")]
    InvalidHemisphere { value: String },

    #[error("Invalid coordinate value '{value}'")]
    InvalidCoordinate { value: String },

    #[error("Unparseable timestamp '{value}'")]
    InvalidTimestamp { value: String },

    #[error("Latitude {latitude} is outside the web Mercator domain")]
    ProjectionDomain { latitude: f64 },

    #[error("Sink error: {reason}")]
    Sink { reason: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("QA check failed: {check} ({expected} expected, {found} found)")]
    QaCheckFailed {
        check: String,
        expected: usize,
        found: usize,
    },

    #[error("Processing interrupted: {reason}")]
    Interrupted { reason: String },
}

impl TrackError {
    /// Create a structural format error for a named source
    pub fn invalid_format(
        source_name: impl Into<String>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidFormat {
            source_name: source_name.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create a CSV reader error for a named source
    pub fn csv_parsing(
        source_name: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            source_name: source_name.into(),
            message: message.into(),
            source,
        }
    }

    /// Whether this error only invalidates a single record
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::InvalidHemisphere { .. }
                | Self::InvalidCoordinate { .. }
                | Self::InvalidTimestamp { .. }
                | Self::ProjectionDomain { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TrackError>;
