//! Output sink interface and record attributes.
//!
//! The pipeline hands every finalized storm and segment to a [`TrackSink`]
//! together with its display and filter attributes. [`MemorySink`] keeps
//! everything in memory; the Parquet writer lives in `writer.rs`.

use crate::constants::{DISPLAY_DATE_FORMAT, OBSERVATION_DATE_FORMAT};
use crate::error::Result;
use crate::geometry::{Polyline, SegmentGeometry};
use crate::models::{Category, Segment, Storm};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Attributes of one storm track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackAttributes {
    pub object_id: usize,
    pub storm_id: String,
    pub display_name: String,
    pub basin: String,
    pub source: String,
    /// YYYYMMDD
    pub begin_date: String,
    /// YYYYMMDD
    pub end_date: String,
    /// "Jun 01, 2018 to Jun 10, 2018"
    pub date_range: String,
    /// Every calendar year the storm touches, comma separated
    pub filter_years: String,
    /// Every calendar month the storm touches, comma separated
    pub filter_months: String,
    pub max_wind: f64,
    pub min_pressure: f64,
    pub max_category: String,
    pub climate_phase: String,
    pub report_url: Option<String>,
    pub observation_count: usize,
    pub has_intensity_data: bool,
}

impl TrackAttributes {
    pub fn from_storm(object_id: usize, storm: &Storm, report_url: Option<String>) -> Self {
        Self {
            object_id,
            storm_id: storm.canonical_id.clone(),
            display_name: storm.display_name.clone(),
            basin: storm.basin.clone(),
            source: storm.source.to_string(),
            begin_date: storm.start_time.format(OBSERVATION_DATE_FORMAT).to_string(),
            end_date: storm.end_time.format(OBSERVATION_DATE_FORMAT).to_string(),
            date_range: date_range(&storm.start_time, &storm.end_time),
            filter_years: join(filter_years(&storm.start_time, &storm.end_time)),
            filter_months: join(filter_months(&storm.start_time, &storm.end_time)),
            max_wind: storm.max_wind,
            min_pressure: storm.min_pressure,
            max_category: storm.max_category.code().to_string(),
            climate_phase: storm.genesis_phase.to_string(),
            report_url,
            observation_count: storm.segment_count,
            has_intensity_data: storm.has_intensity_data(),
        }
    }
}

/// Attributes of one observation segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentAttributes {
    pub object_id: usize,
    pub storm_id: String,
    pub display_name: String,
    pub basin: String,
    pub wind: f64,
    pub pressure: f64,
    pub category: String,
    pub nature: String,
    pub climate_phase: String,
    pub begin_lat: f64,
    pub begin_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    /// Observation hour as HHMM
    pub begin_hour: String,
    /// "09/14/2018 06"
    pub date_time: String,
    /// "Sep 14, 2018"
    pub display_date: String,
    /// "Sep 14, 2018 06z"
    pub display_date_time: String,
    /// Position among all emitted segments
    pub segment_order: usize,
    pub has_intensity_data: bool,
}

impl SegmentAttributes {
    pub fn from_segment(
        object_id: usize,
        segment_order: usize,
        storm: &Storm,
        segment: &Segment,
    ) -> Self {
        let observation = &segment.observation;
        let start = segment.start();
        let end = segment.end.unwrap_or(start);
        let time = &observation.time;

        Self {
            object_id,
            storm_id: storm.canonical_id.clone(),
            display_name: storm.display_name.clone(),
            basin: storm.basin.clone(),
            wind: observation.wind,
            pressure: observation.pressure,
            category: segment
                .category
                .unwrap_or(Category::NotRated)
                .code()
                .to_string(),
            nature: observation.nature.clone(),
            climate_phase: segment.phase.unwrap_or_default().to_string(),
            begin_lat: start.lat,
            begin_lon: start.lon,
            end_lat: end.lat,
            end_lon: end.lon,
            begin_hour: time.format("%H%M").to_string(),
            date_time: time.format("%m/%d/%Y %H").to_string(),
            display_date: time.format(DISPLAY_DATE_FORMAT).to_string(),
            display_date_time: time.format("%b %d, %Y %Hz").to_string(),
            segment_order,
            has_intensity_data: storm.has_intensity_data(),
        }
    }
}

/// Receiver of finalized tracks and segments
pub trait TrackSink {
    fn emit_track(&mut self, track: &[Polyline], attributes: &TrackAttributes) -> Result<()>;

    fn emit_segment(
        &mut self,
        geometry: &SegmentGeometry,
        attributes: &SegmentAttributes,
    ) -> Result<()>;

    /// Flush buffered output once every record has been emitted
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Sink collecting all records in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub tracks: Vec<(Vec<Polyline>, TrackAttributes)>,
    pub segments: Vec<(SegmentGeometry, SegmentAttributes)>,
    pub finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrackSink for MemorySink {
    fn emit_track(&mut self, track: &[Polyline], attributes: &TrackAttributes) -> Result<()> {
        self.tracks.push((track.to_vec(), attributes.clone()));
        Ok(())
    }

    fn emit_segment(
        &mut self,
        geometry: &SegmentGeometry,
        attributes: &SegmentAttributes,
    ) -> Result<()> {
        self.segments.push((geometry.clone(), attributes.clone()));
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }
}

pub fn date_range(start: &DateTime<Utc>, end: &DateTime<Utc>) -> String {
    format!(
        "{} to {}",
        start.format(DISPLAY_DATE_FORMAT),
        end.format(DISPLAY_DATE_FORMAT)
    )
}

pub fn filter_years(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Vec<i32> {
    (start.year()..=end.year()).collect()
}

/// Months from start to end, wrapping through December when the end month
/// precedes the start month
pub fn filter_months(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Vec<u32> {
    let (first, last) = (start.month(), end.month());
    if last < first {
        (first..=12).chain(1..=last).collect()
    } else {
        (first..=last).collect()
    }
}

fn join<T: ToString>(values: Vec<T>) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
