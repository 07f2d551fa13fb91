//! Cyclone Tracks Library
//!
//! Converts tropical cyclone best-track archives (HURDAT2 and IBTrACS) into
//! one de-duplicated set of storm tracks and per-observation segments,
//! ready for mapping.
//!
//! This library provides tools for:
//! - Parsing HURDAT2 text and IBTrACS CSV into a uniform observation model
//! - Resolving storms present in both archives via a crosswalk or by name
//! - Building segment geometry with antimeridian and degenerate-segment handling
//! - Classifying intensity and tagging ENSO climate phases
//! - Writing tracks and segments to Parquet with Snappy compression

pub mod builder;
pub mod cli;
pub mod climate;
pub mod config;
pub mod constants;
pub mod dedup;
pub mod error;
pub mod geometry;
pub mod intensity;
pub mod lookups;
pub mod models;
pub mod parser;
pub mod processor;

// Re-export commonly used types
pub use config::TrackConfig;
pub use error::{Result, TrackError};
pub use lookups::Lookups;
pub use models::{Category, ClimatePhase, Observation, ProcessingStats, Segment, Source, Storm};
pub use processor::sink::{MemorySink, TrackSink};
pub use processor::writer::ParquetSink;
pub use processor::{ProcessingOutcome, TrackProcessor};
