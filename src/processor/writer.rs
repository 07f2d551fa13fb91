//! Parquet output for tracks and segments.
//!
//! Buffers emitted records column by column and writes `tracks.parquet`
//! and `segments.parquet` with Snappy compression when the sink is
//! finished. Geometry is stored as WKT text.

use super::sink::{SegmentAttributes, TrackAttributes, TrackSink};
use crate::constants::{SEGMENTS_OUTPUT_FILENAME, TRACKS_OUTPUT_FILENAME};
use crate::error::{Result, TrackError};
use crate::geometry::{Polyline, SegmentGeometry};

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// WKT text of a one- or multi-part line
pub fn to_wkt(parts: &[Polyline]) -> String {
    let coordinates = |part: &Polyline| {
        part.iter()
            .map(|point| format!("{} {}", point.x, point.y))
            .collect::<Vec<_>>()
            .join(", ")
    };

    match parts {
        [] => "LINESTRING EMPTY".to_string(),
        [single] => format!("LINESTRING ({})", coordinates(single)),
        _ => format!(
            "MULTILINESTRING ({})",
            parts
                .iter()
                .map(|part| format!("({})", coordinates(part)))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

#[derive(Debug, Default)]
struct TrackColumns {
    object_id: Vec<u64>,
    storm_id: Vec<String>,
    display_name: Vec<String>,
    basin: Vec<String>,
    source: Vec<String>,
    begin_date: Vec<String>,
    end_date: Vec<String>,
    date_range: Vec<String>,
    filter_years: Vec<String>,
    filter_months: Vec<String>,
    max_wind: Vec<f64>,
    min_pressure: Vec<f64>,
    max_category: Vec<String>,
    climate_phase: Vec<String>,
    report_url: Vec<Option<String>>,
    observation_count: Vec<u64>,
    has_intensity_data: Vec<bool>,
    geometry: Vec<String>,
}

impl TrackColumns {
    fn push(&mut self, track: &[Polyline], attributes: &TrackAttributes) {
        self.object_id.push(attributes.object_id as u64);
        self.storm_id.push(attributes.storm_id.clone());
        self.display_name.push(attributes.display_name.clone());
        self.basin.push(attributes.basin.clone());
        self.source.push(attributes.source.clone());
        self.begin_date.push(attributes.begin_date.clone());
        self.end_date.push(attributes.end_date.clone());
        self.date_range.push(attributes.date_range.clone());
        self.filter_years.push(attributes.filter_years.clone());
        self.filter_months.push(attributes.filter_months.clone());
        self.max_wind.push(attributes.max_wind);
        self.min_pressure.push(attributes.min_pressure);
        self.max_category.push(attributes.max_category.clone());
        self.climate_phase.push(attributes.climate_phase.clone());
        self.report_url.push(attributes.report_url.clone());
        self.observation_count
            .push(attributes.observation_count as u64);
        self.has_intensity_data.push(attributes.has_intensity_data);
        self.geometry.push(to_wkt(track));
    }

    fn into_frame(self) -> PolarsResult<DataFrame> {
        df!(
            "object_id" => self.object_id,
            "storm_id" => self.storm_id,
            "display_name" => self.display_name,
            "basin" => self.basin,
            "source" => self.source,
            "begin_date" => self.begin_date,
            "end_date" => self.end_date,
            "date_range" => self.date_range,
            "filter_years" => self.filter_years,
            "filter_months" => self.filter_months,
            "max_wind" => self.max_wind,
            "min_pressure" => self.min_pressure,
            "max_category" => self.max_category,
            "climate_phase" => self.climate_phase,
            "report_url" => self.report_url,
            "observation_count" => self.observation_count,
            "has_intensity_data" => self.has_intensity_data,
            "geometry" => self.geometry
        )
    }
}

#[derive(Debug, Default)]
struct SegmentColumns {
    object_id: Vec<u64>,
    storm_id: Vec<String>,
    display_name: Vec<String>,
    basin: Vec<String>,
    wind: Vec<f64>,
    pressure: Vec<f64>,
    category: Vec<String>,
    nature: Vec<String>,
    climate_phase: Vec<String>,
    begin_lat: Vec<f64>,
    begin_lon: Vec<f64>,
    end_lat: Vec<f64>,
    end_lon: Vec<f64>,
    begin_hour: Vec<String>,
    date_time: Vec<String>,
    display_date: Vec<String>,
    display_date_time: Vec<String>,
    segment_order: Vec<u64>,
    has_intensity_data: Vec<bool>,
    geometry: Vec<String>,
}

impl SegmentColumns {
    fn push(&mut self, geometry: &SegmentGeometry, attributes: &SegmentAttributes) {
        self.object_id.push(attributes.object_id as u64);
        self.storm_id.push(attributes.storm_id.clone());
        self.display_name.push(attributes.display_name.clone());
        self.basin.push(attributes.basin.clone());
        self.wind.push(attributes.wind);
        self.pressure.push(attributes.pressure);
        self.category.push(attributes.category.clone());
        self.nature.push(attributes.nature.clone());
        self.climate_phase.push(attributes.climate_phase.clone());
        self.begin_lat.push(attributes.begin_lat);
        self.begin_lon.push(attributes.begin_lon);
        self.end_lat.push(attributes.end_lat);
        self.end_lon.push(attributes.end_lon);
        self.begin_hour.push(attributes.begin_hour.clone());
        self.date_time.push(attributes.date_time.clone());
        self.display_date.push(attributes.display_date.clone());
        self.display_date_time
            .push(attributes.display_date_time.clone());
        self.segment_order.push(attributes.segment_order as u64);
        self.has_intensity_data.push(attributes.has_intensity_data);
        self.geometry.push(to_wkt(&geometry.parts));
    }

    fn into_frame(self) -> PolarsResult<DataFrame> {
        df!(
            "object_id" => self.object_id,
            "storm_id" => self.storm_id,
            "display_name" => self.display_name,
            "basin" => self.basin,
            "wind" => self.wind,
            "pressure" => self.pressure,
            "category" => self.category,
            "nature" => self.nature,
            "climate_phase" => self.climate_phase,
            "begin_lat" => self.begin_lat,
            "begin_lon" => self.begin_lon,
            "end_lat" => self.end_lat,
            "end_lon" => self.end_lon,
            "begin_hour" => self.begin_hour,
            "date_time" => self.date_time,
            "display_date" => self.display_date,
            "display_date_time" => self.display_date_time,
            "segment_order" => self.segment_order,
            "has_intensity_data" => self.has_intensity_data,
            "geometry" => self.geometry
        )
    }
}

/// Sink writing tracks and segments to Parquet files in one directory
#[derive(Debug)]
pub struct ParquetSink {
    output_dir: PathBuf,
    tracks: TrackColumns,
    segments: SegmentColumns,
}

impl ParquetSink {
    /// Create a new Parquet sink writing into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            tracks: TrackColumns::default(),
            segments: SegmentColumns::default(),
        }
    }

    pub fn tracks_path(&self) -> PathBuf {
        self.output_dir.join(TRACKS_OUTPUT_FILENAME)
    }

    pub fn segments_path(&self) -> PathBuf {
        self.output_dir.join(SEGMENTS_OUTPUT_FILENAME)
    }

    fn write_frame(path: &Path, mut df: DataFrame) -> Result<()> {
        let rows = df.height();
        let file = std::fs::File::create(path)?;
        ParquetWriter::new(file)
            .with_compression(ParquetCompression::Snappy)
            .finish(&mut df)
            .map_err(|e| TrackError::Sink {
                reason: format!("Failed to write {}: {}", path.display(), e),
            })?;
        debug!("Wrote {} rows to {}", rows, path.display());
        Ok(())
    }
}

impl TrackSink for ParquetSink {
    fn emit_track(&mut self, track: &[Polyline], attributes: &TrackAttributes) -> Result<()> {
        self.tracks.push(track, attributes);
        Ok(())
    }

    fn emit_segment(
        &mut self,
        geometry: &SegmentGeometry,
        attributes: &SegmentAttributes,
    ) -> Result<()> {
        self.segments.push(geometry, attributes);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;

        let tracks = std::mem::take(&mut self.tracks).into_frame()?;
        let segments = std::mem::take(&mut self.segments).into_frame()?;
        let (track_rows, segment_rows) = (tracks.height(), segments.height());

        Self::write_frame(&self.tracks_path(), tracks)?;
        Self::write_frame(&self.segments_path(), segments)?;

        info!(
            "Wrote {} tracks and {} segments to {}",
            track_rows,
            segment_rows,
            self.output_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use tempfile::TempDir;

    #[test]
    fn test_wkt_encoding() {
        let single = vec![vec![Point::new(-60.0, 10.0), Point::new(-61.5, 11.25)]];
        assert_eq!(to_wkt(&single), "LINESTRING (-60 10, -61.5 11.25)");

        let split = vec![
            vec![Point::new(179.5, 10.0), Point::new(180.0, 11.0)],
            vec![Point::new(-180.0, 11.0), Point::new(-179.5, 12.0)],
        ];
        assert_eq!(
            to_wkt(&split),
            "MULTILINESTRING ((179.5 10, 180 11), (-180 11, -179.5 12))"
        );
        assert_eq!(to_wkt(&[]), "LINESTRING EMPTY");
    }

    #[test]
    fn test_empty_output_files_are_written() {
        let temp_dir = TempDir::new().unwrap();
        let mut sink = ParquetSink::new(temp_dir.path().join("out"));
        sink.finish().unwrap();

        assert!(sink.tracks_path().exists());
        assert!(sink.segments_path().exists());
    }
}
