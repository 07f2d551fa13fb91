//! Input discovery and loading.
//!
//! Locates the best-track archives and lookup files inside a data directory
//! by file name pattern and reads them concurrently.

use crate::constants::{DATA_DIR_NAME, file_patterns};
use crate::error::{Result, TrackError};
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Locations of every input file; `None` where the input is not available
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourcePaths {
    pub hurdat_atlantic: Option<PathBuf>,
    pub hurdat_pacific: Option<PathBuf>,
    pub ibtracs: Option<PathBuf>,
    pub enso: Option<PathBuf>,
    pub crosswalk: Option<PathBuf>,
    pub reports: Option<PathBuf>,
}

impl SourcePaths {
    /// Whether at least one storm track archive is present
    pub fn has_track_source(&self) -> bool {
        self.hurdat_atlantic.is_some() || self.hurdat_pacific.is_some() || self.ibtracs.is_some()
    }

    /// Fill unset entries from another set of paths
    pub fn or(self, fallback: SourcePaths) -> Self {
        Self {
            hurdat_atlantic: self.hurdat_atlantic.or(fallback.hurdat_atlantic),
            hurdat_pacific: self.hurdat_pacific.or(fallback.hurdat_pacific),
            ibtracs: self.ibtracs.or(fallback.ibtracs),
            enso: self.enso.or(fallback.enso),
            crosswalk: self.crosswalk.or(fallback.crosswalk),
            reports: self.reports.or(fallback.reports),
        }
    }
}

/// File contents of every available input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceTexts {
    pub hurdat_atlantic: Option<String>,
    pub hurdat_pacific: Option<String>,
    pub ibtracs: Option<String>,
    pub enso: Option<String>,
    pub crosswalk: Option<String>,
    pub reports: Option<String>,
}

/// Default data directory below the platform data dir
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join(DATA_DIR_NAME))
        .ok_or_else(|| TrackError::Configuration {
            message: "Could not determine user data directory".to_string(),
        })
}

/// File discovery component for the input directory
#[derive(Debug)]
pub struct SourceDiscovery {
    data_dir: PathBuf,
}

impl SourceDiscovery {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Newest file matching a pattern in the data directory
    fn find(&self, pattern: &str) -> Result<Option<PathBuf>> {
        let full_pattern = self.data_dir.join(pattern);
        let entries = glob::glob(&full_pattern.to_string_lossy()).map_err(|e| {
            TrackError::Configuration {
                message: format!("Invalid file pattern '{}': {}", pattern, e),
            }
        })?;

        let mut matches: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
        matches.sort();
        if matches.len() > 1 {
            debug!(
                "{} files match '{}', using the last in name order",
                matches.len(),
                pattern
            );
        }
        Ok(matches.pop())
    }

    /// Search the data directory for every input
    pub fn discover(&self) -> Result<SourcePaths> {
        if !self.data_dir.exists() {
            return Err(TrackError::SourceNotFound {
                path: self.data_dir.clone(),
            });
        }

        debug!("Searching for inputs in: {}", self.data_dir.display());

        let paths = SourcePaths {
            hurdat_atlantic: self.find(file_patterns::HURDAT_ATLANTIC)?,
            hurdat_pacific: self.find(file_patterns::HURDAT_PACIFIC)?,
            ibtracs: self.find(file_patterns::IBTRACS)?,
            enso: self.find(file_patterns::ENSO)?,
            crosswalk: self.find(file_patterns::CROSSWALK)?,
            reports: self.find(file_patterns::REPORTS)?,
        };

        if paths.enso.is_none() {
            warn!("No ENSO anomaly file found, climate phases will be unknown");
        }
        if paths.crosswalk.is_none() {
            warn!("No crosswalk file found, duplicates will be matched by name");
        }

        Ok(paths)
    }
}

async fn read_optional(path: Option<&PathBuf>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    if !path.exists() {
        return Err(TrackError::SourceNotFound { path: path.clone() });
    }
    let text = fs::read_to_string(path).await?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(Some(text))
}

/// Read every available input concurrently
pub async fn read_sources(paths: &SourcePaths) -> Result<SourceTexts> {
    let ordered = [
        paths.hurdat_atlantic.as_ref(),
        paths.hurdat_pacific.as_ref(),
        paths.ibtracs.as_ref(),
        paths.enso.as_ref(),
        paths.crosswalk.as_ref(),
        paths.reports.as_ref(),
    ];

    let mut texts = try_join_all(ordered.into_iter().map(read_optional))
        .await?
        .into_iter();
    let mut next = || texts.next().flatten();

    Ok(SourceTexts {
        hurdat_atlantic: next(),
        hurdat_pacific: next(),
        ibtracs: next(),
        enso: next(),
        crosswalk: next(),
        reports: next(),
    })
}
