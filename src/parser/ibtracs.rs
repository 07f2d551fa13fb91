//! IBTrACS multi-agency CSV parser.
//!
//! IBTrACS v04 ships one row per observation with two header rows (column
//! names, units). Consecutive rows sharing a storm id form one storm. Wind
//! and pressure come from the first agency, in a fixed priority order, that
//! reported a wind value.

use super::{ParseStats, ParsedSource, StormHeader, StormRecord, TrackParser, parse_measurement};
use crate::constants::{
    FALLBACK_DATETIME_FORMAT, IBTRACS_DATETIME_FORMAT, IBTRACS_SOURCE_NAME, MISSING_VALUE,
    PROVISIONAL_FLAG, ibtracs_columns as columns, is_off_synoptic,
};
use crate::error::{Result, TrackError};
use crate::models::{Observation, Source};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use csv::StringRecord;
use tracing::debug;

/// Parser for the IBTrACS global CSV archive
#[derive(Debug, Clone)]
pub struct IbtracsParser {
    filter_off_synoptic: bool,
}

impl Default for IbtracsParser {
    fn default() -> Self {
        Self {
            filter_off_synoptic: true,
        }
    }
}

/// Storm being accumulated from consecutive rows
struct PendingStorm {
    header: StormHeader,
    observations: Vec<Observation>,
}

impl PendingStorm {
    fn finish(self) -> StormRecord {
        StormRecord {
            header: self.header,
            observations: self.observations,
        }
    }
}

impl IbtracsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable dropping of fixes at 03, 09, 15 and 21 UTC
    pub fn with_off_synoptic_filter(mut self, enabled: bool) -> Self {
        self.filter_off_synoptic = enabled;
        self
    }

    fn header_for(fields: &StringRecord) -> StormHeader {
        StormHeader {
            id: fields[columns::SID].trim().to_string(),
            name: fields[columns::NAME].trim().to_string(),
            basin: fields[columns::BASIN].trim().to_string(),
            source: Source::Ibtracs,
            declared_count: None,
            provisional: false,
        }
    }

    fn parse_row(fields: &StringRecord) -> Result<Observation> {
        let time = parse_timestamp(&fields[columns::ISO_TIME])?;
        let lat = parse_coordinate(&fields[columns::LAT])?;
        let mut lon = parse_coordinate(&fields[columns::LON])?;
        if lon > 180.0 {
            lon -= 360.0;
        }
        let (wind, pressure) = first_agency_report(fields);

        Ok(Observation {
            time,
            lat,
            lon,
            wind,
            pressure,
            nature: fields[columns::NATURE].trim().to_string(),
        })
    }
}

impl TrackParser for IbtracsParser {
    fn source(&self) -> Source {
        Source::Ibtracs
    }

    fn parse(&self, text: &str) -> Result<ParsedSource> {
        let mut storms = Vec::new();
        let mut stats = ParseStats::default();
        let mut pending: Option<PendingStorm> = None;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        let mut fields = StringRecord::new();
        let mut rows_read = 0;

        while reader.read_record(&mut fields).map_err(|e| {
            TrackError::csv_parsing(IBTRACS_SOURCE_NAME, "Failed to read CSV record", Some(e))
        })? {
            rows_read += 1;
            if rows_read <= columns::HEADER_ROWS {
                continue;
            }
            if fields.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let line_number = fields
                .position()
                .map_or(rows_read, |position| position.line() as usize);
            if fields.len() <= columns::TRACK_TYPE {
                return Err(TrackError::invalid_format(
                    IBTRACS_SOURCE_NAME,
                    line_number,
                    format!(
                        "expected at least {} columns, found {}",
                        columns::TRACK_TYPE + 1,
                        fields.len()
                    ),
                ));
            }

            let sid = fields[columns::SID].trim().to_string();
            let storm = match pending.take() {
                Some(storm) if storm.header.id == sid => storm,
                previous => {
                    if let Some(done) = previous {
                        storms.push(done.finish());
                    }
                    PendingStorm {
                        header: Self::header_for(&fields),
                        observations: Vec::new(),
                    }
                }
            };
            let storm = pending.insert(storm);

            if fields[columns::TRACK_TYPE].trim() == PROVISIONAL_FLAG {
                storm.header.provisional = true;
            }

            match Self::parse_row(&fields) {
                Ok(observation) => {
                    let hhmm = observation.time.hour() * 100 + observation.time.minute();
                    if self.filter_off_synoptic && is_off_synoptic(hhmm) {
                        stats.off_synoptic_dropped += 1;
                    } else {
                        storm.observations.push(observation);
                    }
                }
                Err(error) if error.is_record_level() => {
                    debug!(
                        "Skipping {} line {} of storm {}: {}",
                        IBTRACS_SOURCE_NAME, line_number, sid, error
                    );
                    if matches!(error, TrackError::InvalidTimestamp { .. }) {
                        stats.timestamp_errors += 1;
                    } else {
                        stats.coordinate_errors += 1;
                    }
                }
                Err(error) => return Err(error),
            }
        }

        if let Some(done) = pending {
            storms.push(done.finish());
        }

        debug!(
            "Parsed {} storms from {} ({} off-synoptic fixes dropped, {} record errors)",
            storms.len(),
            IBTRACS_SOURCE_NAME,
            stats.off_synoptic_dropped,
            stats.coordinate_errors + stats.timestamp_errors
        );

        Ok(ParsedSource {
            source: Source::Ibtracs,
            storms,
            stats,
        })
    }
}

/// Wind and pressure of the highest-priority agency with a non-blank wind
fn first_agency_report(fields: &StringRecord) -> (f64, f64) {
    columns::AGENCY_WIND_COLUMNS
        .iter()
        .find_map(|&wind_column| {
            let wind = fields.get(wind_column)?.trim();
            if wind.is_empty() {
                return None;
            }
            let pressure = fields.get(wind_column + 1).unwrap_or_default();
            Some((parse_measurement(wind), parse_measurement(pressure)))
        })
        .unwrap_or((MISSING_VALUE, MISSING_VALUE))
}

fn parse_timestamp(field: &str) -> Result<DateTime<Utc>> {
    let value = field.trim();
    NaiveDateTime::parse_from_str(value, IBTRACS_DATETIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, FALLBACK_DATETIME_FORMAT))
        .map(|naive| naive.and_utc())
        .map_err(|_| TrackError::InvalidTimestamp {
            value: value.to_string(),
        })
}

fn parse_coordinate(field: &str) -> Result<f64> {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| TrackError::InvalidCoordinate {
            value: field.trim().to_string(),
        })
}
