//! Command-line interface definitions.

use crate::config::{AntimeridianMode, ProvisionalPolicy, SourcePreference, TrackConfig};
use crate::constants::DEFAULT_DEDUP_WINDOW;
use crate::error::Result;
use crate::processor::discovery::{SourceDiscovery, SourcePaths, default_data_dir};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How tracks crossing the antimeridian are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AntimeridianArg {
    /// Split crossing segments into two parts meeting at ±180°
    Split,
    /// Keep tracks continuous with longitudes beyond ±180°
    Unwrap,
}

impl From<AntimeridianArg> for AntimeridianMode {
    fn from(arg: AntimeridianArg) -> Self {
        match arg {
            AntimeridianArg::Split => AntimeridianMode::Split,
            AntimeridianArg::Unwrap => AntimeridianMode::Unwrap,
        }
    }
}

/// Merge HURDAT2 and IBTrACS best tracks into de-duplicated storm tracks
#[derive(Parser, Debug, Clone)]
#[command(name = "cyclone_tracks")]
#[command(about = "Convert HURDAT2 and IBTrACS best-track archives to storm track Parquet files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Directory searched for input files not given explicitly
    #[arg(long = "data-dir", value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// HURDAT2 North Atlantic file
    #[arg(long, value_name = "FILE")]
    pub atlantic: Option<PathBuf>,

    /// HURDAT2 North-East Pacific file
    #[arg(long, value_name = "FILE")]
    pub pacific: Option<PathBuf>,

    /// IBTrACS CSV file
    #[arg(long, value_name = "FILE")]
    pub ibtracs: Option<PathBuf>,

    /// Monthly ENSO (Niño 3.4) anomaly file
    #[arg(long, value_name = "FILE")]
    pub enso: Option<PathBuf>,

    /// IBTrACS serial number to ATCF id mapping file
    #[arg(long, value_name = "FILE")]
    pub crosswalk: Option<PathBuf>,

    /// Storm report index (name,year,url per line)
    #[arg(long, value_name = "FILE")]
    pub reports: Option<PathBuf>,

    /// Output directory for tracks.parquet and segments.parquet
    #[arg(short, long, value_name = "PATH", default_value = "output")]
    pub output: PathBuf,

    /// Antimeridian handling
    #[arg(long, value_enum, default_value_t = AntimeridianArg::Split)]
    pub antimeridian: AntimeridianArg,

    /// Keep geographic coordinates instead of projecting to web Mercator
    #[arg(long)]
    pub geographic: bool,

    /// Keep the IBTrACS copy of storms present in both archives
    #[arg(long)]
    pub prefer_global: bool,

    /// Leave provisional IBTrACS storms out of the output
    #[arg(long)]
    pub omit_provisional: bool,

    /// Keep IBTrACS fixes at 03, 09, 15 and 21 UTC
    #[arg(long)]
    pub keep_off_synoptic: bool,

    /// Recently accepted storms compared when matching duplicates by name
    #[arg(long, value_name = "N", default_value_t = DEFAULT_DEDUP_WINDOW)]
    pub dedup_window: usize,

    /// Show a progress spinner while processing
    #[arg(long)]
    pub progress: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Build the processing configuration from the flags
    pub fn to_config(&self) -> TrackConfig {
        let provisional_policy = if self.omit_provisional {
            ProvisionalPolicy::Omit
        } else {
            ProvisionalPolicy::Label
        };
        let source_preference = if self.prefer_global {
            SourcePreference::PreferGlobal
        } else {
            SourcePreference::PreferRegional
        };

        TrackConfig::new()
            .with_antimeridian_mode(self.antimeridian.into())
            .with_projection(!self.geographic)
            .with_off_synoptic_filter(!self.keep_off_synoptic)
            .with_provisional_policy(provisional_policy)
            .with_source_preference(source_preference)
            .with_dedup_window(self.dedup_window)
            .with_progress(self.progress)
    }

    /// Paths given on the command line
    pub fn explicit_paths(&self) -> SourcePaths {
        SourcePaths {
            hurdat_atlantic: self.atlantic.clone(),
            hurdat_pacific: self.pacific.clone(),
            ibtracs: self.ibtracs.clone(),
            enso: self.enso.clone(),
            crosswalk: self.crosswalk.clone(),
            reports: self.reports.clone(),
        }
    }

    /// Explicit paths, completed from the data directory when it exists
    pub fn source_paths(&self) -> Result<SourcePaths> {
        let explicit = self.explicit_paths();
        let data_dir = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };

        // The default directory is optional once files are named explicitly
        if self.data_dir.is_none() && !data_dir.exists() && explicit.has_track_source() {
            return Ok(explicit);
        }

        let discovered = SourceDiscovery::new(data_dir).discover()?;
        Ok(explicit.or(discovered))
    }
}
