//! Segment geometry construction.
//!
//! Every observation becomes a line segment running to the next observation.
//! Two passes are made over a storm:
//!
//! 1. [`GeometryProcessor::assign_endpoints`] walks consecutive pairs,
//!    unwrapping antimeridian jumps (unwrap mode), nudging near-identical
//!    points apart and setting each segment's end to its successor's start.
//!    The final segment ends at a small fixed offset from its own start.
//! 2. [`GeometryProcessor::render`] turns each segment into one polyline, or
//!    two when it crosses the antimeridian in split mode, and optionally
//!    projects every vertex to spherical web Mercator.

use crate::config::{AntimeridianMode, TrackConfig};
use crate::constants::{ANTIMERIDIAN_JUMP_DEGREES, EARTH_RADIUS_M, MAX_PROJECTABLE_LATITUDE};
use crate::error::{Result, TrackError};
use crate::models::{Coordinate, Segment, Storm};
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_4;
use tracing::{debug, warn};

/// Vertex of an output polyline; degrees (x = lon, y = lat) or metres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn from_coordinate(coordinate: Coordinate) -> Self {
        Self::new(coordinate.lon, coordinate.lat)
    }
}

pub type Polyline = Vec<Point>;

/// Rendered shape of one segment: one part, or two across the antimeridian
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentGeometry {
    pub parts: Vec<Polyline>,
}

impl SegmentGeometry {
    pub fn is_split(&self) -> bool {
        self.parts.len() > 1
    }
}

/// Rendered shapes of a storm
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StormGeometry {
    /// Aligned with the storm's segments; `None` where projection failed
    pub segments: Vec<Option<SegmentGeometry>>,
    /// Concatenation of the rendered segment parts
    pub track: Vec<Polyline>,
    pub crossings: usize,
    pub projection_errors: usize,
}

/// Project a geographic point to spherical web Mercator metres
pub fn project(lon: f64, lat: f64) -> Result<Point> {
    if !lat.is_finite() || lat.abs() >= MAX_PROJECTABLE_LATITUDE {
        return Err(TrackError::ProjectionDomain { latitude: lat });
    }
    let x = EARTH_RADIUS_M * lon.to_radians();
    let y = EARTH_RADIUS_M * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    if !x.is_finite() || !y.is_finite() {
        return Err(TrackError::ProjectionDomain { latitude: lat });
    }
    Ok(Point::new(x, y))
}

/// Latitude at which the segment from `start` to `end` meets the antimeridian.
///
/// The segment is parameterized by each endpoint's longitudinal distance to
/// the ±180° line.
pub fn crossing_latitude(start: Coordinate, end: Coordinate) -> f64 {
    let to_boundary_start = 180.0 - start.lon.abs();
    let to_boundary_end = 180.0 - end.lon.abs();
    let total = to_boundary_start + to_boundary_end;
    let fraction = if total == 0.0 {
        0.5
    } else {
        to_boundary_start / total
    };
    start.lat + (end.lat - start.lat) * fraction
}

/// Split a crossing segment into two parts meeting at ±180°
pub fn split_at_antimeridian(start: Coordinate, end: Coordinate) -> Vec<Polyline> {
    let latitude = crossing_latitude(start, end);
    let first = vec![
        Point::from_coordinate(start),
        Point::new(180.0_f64.copysign(start.lon), latitude),
    ];
    let second = vec![
        Point::new(180.0_f64.copysign(end.lon), latitude),
        Point::from_coordinate(end),
    ];

    [first, second]
        .into_iter()
        .filter(|part| part[0] != part[1])
        .collect()
}

/// Shift `value` by `offset`, reversing the shift if it would leave ±`limit`
fn offset_within(value: f64, offset: f64, limit: f64) -> f64 {
    let shifted = value + offset;
    if shifted.abs() > limit { value - offset } else { shifted }
}

fn crosses_antimeridian(a: f64, b: f64) -> bool {
    (a - b).abs() > ANTIMERIDIAN_JUMP_DEGREES
}

/// Builds segment endpoints and rendered shapes
#[derive(Debug, Clone)]
pub struct GeometryProcessor {
    mode: AntimeridianMode,
    project: bool,
    degenerate_threshold: f64,
    degenerate_offset: f64,
    final_segment_offset: f64,
}

impl GeometryProcessor {
    pub fn new(config: &TrackConfig) -> Self {
        Self {
            mode: config.antimeridian_mode,
            project: config.project_to_web_mercator,
            degenerate_threshold: config.degenerate_threshold,
            degenerate_offset: config.degenerate_offset,
            final_segment_offset: config.final_segment_offset,
        }
    }

    /// Set every segment's end coordinate; returns the number of nudges applied
    pub fn assign_endpoints(&self, segments: &mut [Segment]) -> usize {
        let mut nudges = 0;
        // Unwrapped tracks may run past ±180° on purpose
        let lon_limit = match self.mode {
            AntimeridianMode::Split => 180.0,
            AntimeridianMode::Unwrap => f64::INFINITY,
        };

        for i in 0..segments.len().saturating_sub(1) {
            let start = segments[i].start();
            let next = &mut segments[i + 1].observation;

            if self.mode == AntimeridianMode::Unwrap && crosses_antimeridian(start.lon, next.lon) {
                next.lon += 360.0_f64.copysign(start.lon);
            }

            if start.distance_to(&next.position()) < self.degenerate_threshold {
                let lon_offset = self.degenerate_offset.copysign(direction(next.lon - start.lon));
                let lat_offset = self.degenerate_offset.copysign(direction(next.lat - start.lat));
                next.lon = offset_within(next.lon, lon_offset, lon_limit);
                next.lat = offset_within(next.lat, lat_offset, 90.0);
                nudges += 1;
            }

            segments[i].end = Some(segments[i + 1].start());
        }

        if let Some(last) = segments.last_mut() {
            let start = last.start();
            last.end = Some(Coordinate::new(
                offset_within(start.lat, self.final_segment_offset, 90.0),
                offset_within(start.lon, self.final_segment_offset, lon_limit),
            ));
        }

        nudges
    }

    /// Geographic parts of one segment
    fn segment_parts(&self, segment: &Segment) -> (Vec<Polyline>, bool) {
        let start = segment.start();
        let end = segment.end.unwrap_or(start);

        if self.mode == AntimeridianMode::Split && crosses_antimeridian(start.lon, end.lon) {
            (split_at_antimeridian(start, end), true)
        } else {
            (
                vec![vec![Point::from_coordinate(start), Point::from_coordinate(end)]],
                false,
            )
        }
    }

    fn project_parts(parts: Vec<Polyline>) -> Result<Vec<Polyline>> {
        parts
            .into_iter()
            .map(|part| {
                part.into_iter()
                    .map(|point| project(point.x, point.y))
                    .collect::<Result<Polyline>>()
            })
            .collect()
    }

    /// Render every segment of a storm whose endpoints have been assigned
    pub fn render(&self, storm: &Storm) -> StormGeometry {
        let mut geometry = StormGeometry::default();

        for (order, segment) in storm.segments.iter().enumerate() {
            let (parts, crossed) = self.segment_parts(segment);
            let parts = if self.project {
                match Self::project_parts(parts) {
                    Ok(projected) => projected,
                    Err(error) => {
                        warn!(
                            "Omitting segment {} of {}: {}",
                            order, storm.display_name, error
                        );
                        geometry.projection_errors += 1;
                        geometry.segments.push(None);
                        continue;
                    }
                }
            } else {
                parts
            };

            if crossed {
                geometry.crossings += 1;
            }
            geometry.track.extend(parts.iter().cloned());
            geometry.segments.push(Some(SegmentGeometry { parts }));
        }

        debug!(
            "Rendered {} with {} track parts ({} antimeridian crossings)",
            storm.display_name,
            geometry.track.len(),
            geometry.crossings
        );
        geometry
    }
}

/// Sign used to push a point away from its predecessor; zero counts as positive
fn direction(delta: f64) -> f64 {
    if delta < 0.0 { -1.0 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Observation;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn segments(points: &[(f64, f64)]) -> Vec<Segment> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(lon, lat))| {
                Segment::new(Observation {
                    time: Utc.with_ymd_and_hms(2018, 9, 1, 0, 0, 0).unwrap()
                        + chrono::Duration::hours(6 * i as i64),
                    lat,
                    lon,
                    wind: 50.0,
                    pressure: 990.0,
                    nature: "TS".to_string(),
                })
            })
            .collect()
    }

    fn geographic(mode: AntimeridianMode) -> GeometryProcessor {
        GeometryProcessor::new(
            &TrackConfig::default()
                .with_antimeridian_mode(mode)
                .with_projection(false),
        )
    }

    #[test]
    fn test_projection_origin() {
        let point = project(0.0, 0.0).unwrap();
        assert_relative_eq!(point.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(point.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_projection_known_values() {
        let point = project(180.0, 0.0).unwrap();
        assert_relative_eq!(point.x, 20_037_508.342789244, epsilon = 1e-6);

        let point = project(0.0, 45.0).unwrap();
        assert_relative_eq!(point.y, 5_621_521.486192066, epsilon = 1e-3);
    }

    #[test]
    fn test_projection_domain() {
        assert!(matches!(
            project(10.0, 89.9),
            Err(TrackError::ProjectionDomain { .. })
        ));
        assert!(project(10.0, -90.0).is_err());
        assert!(project(10.0, 89.89).is_ok());
    }

    #[test]
    fn test_endpoints_chain() {
        let processor = geographic(AntimeridianMode::Split);
        let mut segs = segments(&[(-60.0, 10.0), (-61.0, 11.0), (-62.5, 12.0)]);
        let nudges = processor.assign_endpoints(&mut segs);

        assert_eq!(nudges, 0);
        assert_eq!(segs[0].end, Some(segs[1].start()));
        assert_eq!(segs[1].end, Some(segs[2].start()));
        let last = segs[2].end.unwrap();
        assert_relative_eq!(last.lat, 12.0001, epsilon = 1e-12);
        assert_relative_eq!(last.lon, -62.4999, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_segment_has_positive_length() {
        let processor = geographic(AntimeridianMode::Split);
        let mut segs = segments(&[(-60.0, 10.0), (-60.05, 10.0)]);
        let nudges = processor.assign_endpoints(&mut segs);

        assert_eq!(nudges, 1);
        let start = segs[0].start();
        let end = segs[0].end.unwrap();
        assert!(start.distance_to(&end) > 0.05);
        assert_relative_eq!(end.lon, -60.051, epsilon = 1e-9);
        assert_relative_eq!(end.lat, 10.001, epsilon = 1e-9);
    }

    #[test]
    fn test_identical_points_are_separated() {
        let processor = geographic(AntimeridianMode::Split);
        let mut segs = segments(&[(120.0, 15.0), (120.0, 15.0)]);
        processor.assign_endpoints(&mut segs);
        let end = segs[0].end.unwrap();
        assert!(segs[0].start().distance_to(&end) > 0.0);
    }

    #[test]
    fn test_offsets_stay_within_longitude_range() {
        let processor = geographic(AntimeridianMode::Split);
        let mut segs = segments(&[(179.95, 10.0), (180.0, 10.0)]);
        let nudges = processor.assign_endpoints(&mut segs);

        assert_eq!(nudges, 1);
        let end = segs[0].end.unwrap();
        assert_relative_eq!(end.lon, 179.999, epsilon = 1e-9);
        assert!(segs[0].start().distance_to(&end) > 0.0);

        for segment in &segs {
            assert!(segment.start().lon.abs() <= 180.0);
            assert!(segment.end.unwrap().lon.abs() <= 180.0);
        }

        let mut single = segments(&[(180.0, 10.0)]);
        processor.assign_endpoints(&mut single);
        let last = single[0].end.unwrap();
        assert_relative_eq!(last.lon, 179.9999, epsilon = 1e-9);
        assert_relative_eq!(last.lat, 10.0001, epsilon = 1e-9);
    }

    #[test]
    fn test_unwrap_mode_offsets_are_unbounded() {
        let processor = geographic(AntimeridianMode::Unwrap);
        let mut segs = segments(&[(180.0, 10.0)]);
        processor.assign_endpoints(&mut segs);
        assert_relative_eq!(segs[0].end.unwrap().lon, 180.0001, epsilon = 1e-9);
    }

    #[test]
    fn test_split_at_antimeridian() {
        let parts = split_at_antimeridian(Coordinate::new(10.0, 179.5), Coordinate::new(12.0, -179.5));
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0][1].x, 180.0);
        assert_eq!(parts[1][0].x, -180.0);
        let latitude = parts[0][1].y;
        assert!(latitude > 10.0 && latitude < 12.0);
        assert_relative_eq!(latitude, 11.0, epsilon = 1e-9);
        assert_eq!(parts[1][0].y, latitude);
    }

    #[test]
    fn test_crossing_latitude_is_weighted() {
        let latitude = crossing_latitude(Coordinate::new(10.0, 179.0), Coordinate::new(14.0, -177.0));
        assert_relative_eq!(latitude, 11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_length_part_dropped() {
        let parts = split_at_antimeridian(Coordinate::new(10.0, 180.0), Coordinate::new(12.0, -179.0));
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0][0].x, -180.0);
    }

    #[test]
    fn test_render_split_mode() {
        let processor = geographic(AntimeridianMode::Split);
        let mut storm_segments = segments(&[(179.5, 10.0), (-179.5, 12.0), (-178.0, 13.0)]);
        processor.assign_endpoints(&mut storm_segments);
        let storm = test_storm(storm_segments);

        let geometry = processor.render(&storm);
        assert_eq!(geometry.crossings, 1);
        assert_eq!(geometry.segments.len(), 3);
        assert!(geometry.segments[0].as_ref().unwrap().is_split());
        assert_eq!(geometry.track.len(), 4);
        for part in &geometry.track {
            assert!(part.iter().all(|p| p.x.abs() <= 180.0));
        }
    }

    #[test]
    fn test_unwrap_mode_carries_shift_forward() {
        let processor = geographic(AntimeridianMode::Unwrap);
        let mut segs = segments(&[(179.0, 10.0), (-179.0, 11.0), (-178.0, 12.0)]);
        processor.assign_endpoints(&mut segs);

        assert_relative_eq!(segs[1].observation.lon, 181.0);
        assert_relative_eq!(segs[2].observation.lon, 182.0);
        assert_relative_eq!(segs[0].end.unwrap().lon, 181.0);

        let geometry = processor.render(&test_storm(segs));
        assert_eq!(geometry.crossings, 0);
        assert_eq!(geometry.track.len(), 3);
    }

    #[test]
    fn test_projection_error_omits_segment() {
        let processor = GeometryProcessor::new(&TrackConfig::default());
        let mut segs = segments(&[(-40.0, 85.0), (-41.0, 89.95), (-42.0, 86.0)]);
        processor.assign_endpoints(&mut segs);

        let geometry = processor.render(&test_storm(segs));
        // Segments starting or ending at 89.95 fail
        assert_eq!(geometry.projection_errors, 2);
        assert!(geometry.segments[0].is_none());
        assert!(geometry.segments[1].is_none());
        assert!(geometry.segments[2].is_some());
        assert_eq!(geometry.track.len(), 1);
    }

    fn test_storm(segments: Vec<Segment>) -> Storm {
        let start_time = segments[0].observation.time;
        let end_time = segments[segments.len() - 1].observation.time;
        Storm {
            source_id: "TEST".to_string(),
            canonical_id: "TEST".to_string(),
            name: "TEST".to_string(),
            display_name: "TEST 2018".to_string(),
            basin: "WP".to_string(),
            source: crate::models::Source::Ibtracs,
            provisional: false,
            segment_count: segments.len(),
            segments,
            start_time,
            end_time,
            max_wind: 50.0,
            min_pressure: 990.0,
            max_category: crate::models::Category::TropicalStorm,
            genesis_phase: crate::models::ClimatePhase::Neutral,
        }
    }
}
