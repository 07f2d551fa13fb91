//! Configuration management and validation.
//!
//! Provides the tunables of the track pipeline: antimeridian handling,
//! projection, degenerate-segment tolerances, the provisional-record policy
//! and deduplication preferences.

use crate::constants::{
    DEFAULT_DEDUP_WINDOW, DEFAULT_DEGENERATE_OFFSET, DEFAULT_DEGENERATE_THRESHOLD,
    DEFAULT_FINAL_SEGMENT_OFFSET,
};
use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How segments crossing the antimeridian are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AntimeridianMode {
    /// Keep longitudes in [-180, 180] and split crossing segments in two
    Split,
    /// Shift longitudes by 360 so the track stays continuous
    Unwrap,
}

/// What happens to storms flagged provisional by their source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisionalPolicy {
    /// Keep the storm and append the provisional marker to its display name
    Label,
    /// Route the storm to a side list excluded from the output
    Omit,
    /// Keep the storm unlabeled
    Ignore,
}

/// Which archive wins when two records describe the same storm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourcePreference {
    PreferRegional,
    PreferGlobal,
}

impl SourcePreference {
    /// Whether a record from a source of this class is preferred
    pub fn prefers(&self, regional: bool) -> bool {
        match self {
            SourcePreference::PreferRegional => regional,
            SourcePreference::PreferGlobal => !regional,
        }
    }
}

/// Main configuration for track processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackConfig {
    pub antimeridian_mode: AntimeridianMode,

    /// Project output coordinates to web Mercator metres
    pub project_to_web_mercator: bool,

    /// Segments shorter than this (degrees) are nudged
    pub degenerate_threshold: f64,

    /// Per-axis nudge applied to degenerate segments (degrees)
    pub degenerate_offset: f64,

    /// Offset of the synthetic end of a storm's final segment (degrees)
    pub final_segment_offset: f64,

    /// Drop IBTrACS fixes at 03, 09, 15 and 21 UTC
    pub filter_off_synoptic: bool,

    pub provisional_policy: ProvisionalPolicy,

    pub source_preference: SourcePreference,

    /// Accepted storms compared against in name-based deduplication
    pub dedup_window: usize,

    /// Show a spinner while the pipeline runs
    pub show_progress: bool,
}

impl Default for TrackConfig {
    fn default() -> Self {
        Self {
            antimeridian_mode: AntimeridianMode::Split,
            project_to_web_mercator: true,
            degenerate_threshold: DEFAULT_DEGENERATE_THRESHOLD,
            degenerate_offset: DEFAULT_DEGENERATE_OFFSET,
            final_segment_offset: DEFAULT_FINAL_SEGMENT_OFFSET,
            filter_off_synoptic: true,
            provisional_policy: ProvisionalPolicy::Label,
            source_preference: SourcePreference::PreferRegional,
            dedup_window: DEFAULT_DEDUP_WINDOW,
            show_progress: false,
        }
    }
}

impl TrackConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_antimeridian_mode(mut self, mode: AntimeridianMode) -> Self {
        self.antimeridian_mode = mode;
        self
    }

    pub fn with_projection(mut self, project: bool) -> Self {
        self.project_to_web_mercator = project;
        self
    }

    pub fn with_degenerate_threshold(mut self, threshold: f64) -> Self {
        self.degenerate_threshold = threshold;
        self
    }

    pub fn with_degenerate_offset(mut self, offset: f64) -> Self {
        self.degenerate_offset = offset;
        self
    }

    pub fn with_final_segment_offset(mut self, offset: f64) -> Self {
        self.final_segment_offset = offset;
        self
    }

    pub fn with_off_synoptic_filter(mut self, enabled: bool) -> Self {
        self.filter_off_synoptic = enabled;
        self
    }

    pub fn with_provisional_policy(mut self, policy: ProvisionalPolicy) -> Self {
        self.provisional_policy = policy;
        self
    }

    pub fn with_source_preference(mut self, preference: SourcePreference) -> Self {
        self.source_preference = preference;
        self
    }

    pub fn with_dedup_window(mut self, window: usize) -> Self {
        self.dedup_window = window;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        debug!("Validating track configuration: {:?}", self);

        if self.dedup_window == 0 {
            return Err(TrackError::Configuration {
                message: "Deduplication window must be at least 1".to_string(),
            });
        }

        for (name, value) in [
            ("degenerate_threshold", self.degenerate_threshold),
            ("degenerate_offset", self.degenerate_offset),
            ("final_segment_offset", self.final_segment_offset),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(TrackError::Configuration {
                    message: format!("{} must be a positive number, got {}", name, value),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackConfig::default();
        assert_eq!(config.antimeridian_mode, AntimeridianMode::Split);
        assert!(config.project_to_web_mercator);
        assert!(config.filter_off_synoptic);
        assert_eq!(config.provisional_policy, ProvisionalPolicy::Label);
        assert_eq!(config.source_preference, SourcePreference::PreferRegional);
        assert_eq!(config.dedup_window, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = TrackConfig::new()
            .with_antimeridian_mode(AntimeridianMode::Unwrap)
            .with_projection(false)
            .with_provisional_policy(ProvisionalPolicy::Omit)
            .with_source_preference(SourcePreference::PreferGlobal)
            .with_dedup_window(3);

        assert_eq!(config.antimeridian_mode, AntimeridianMode::Unwrap);
        assert!(!config.project_to_web_mercator);
        assert_eq!(config.provisional_policy, ProvisionalPolicy::Omit);
        assert_eq!(config.dedup_window, 3);
    }

    #[test]
    fn test_invalid_values() {
        assert!(TrackConfig::new().with_dedup_window(0).validate().is_err());
        assert!(
            TrackConfig::new()
                .with_degenerate_offset(-0.001)
                .validate()
                .is_err()
        );
        assert!(
            TrackConfig::new()
                .with_degenerate_threshold(f64::NAN)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_source_preference() {
        assert!(SourcePreference::PreferRegional.prefers(true));
        assert!(!SourcePreference::PreferRegional.prefers(false));
        assert!(SourcePreference::PreferGlobal.prefers(false));
    }
}
