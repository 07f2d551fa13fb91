//! HURDAT2 fixed-layout parser.
//!
//! A HURDAT2 file is a sequence of storms, each a header line
//! `AL092005, KATRINA, 34,` followed by exactly the declared number of
//! observation lines:
//!
//! ```text
//! 20050823, 1800,  , TD, 23.1N,  75.1W,  30, 1008, ...
//! ```

use super::{ParseStats, ParsedSource, StormHeader, StormRecord, TrackParser, parse_measurement};
use crate::constants::{
    ATLANTIC_BASIN, HURDAT_DATETIME_FORMAT, HURDAT_SOURCE_NAME, PACIFIC_BASIN,
};
use crate::error::{Result, TrackError};
use crate::models::{Observation, Source};
use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::{debug, warn};

const MIN_OBSERVATION_FIELDS: usize = 8;

/// Parser for one HURDAT2 basin file
#[derive(Debug, Clone)]
pub struct HurdatParser {
    source: Source,
    basin: String,
}

impl HurdatParser {
    pub fn new(source: Source, basin: impl Into<String>) -> Self {
        Self {
            source,
            basin: basin.into(),
        }
    }

    /// Parser for the North Atlantic archive
    pub fn atlantic() -> Self {
        Self::new(Source::HurdatAtlantic, ATLANTIC_BASIN)
    }

    /// Parser for the North-East Pacific archive
    pub fn pacific() -> Self {
        Self::new(Source::HurdatPacific, PACIFIC_BASIN)
    }

    fn parse_header(&self, line_number: usize, line: &str) -> Result<StormHeader> {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() < 3 {
            return Err(TrackError::invalid_format(
                HURDAT_SOURCE_NAME,
                line_number,
                "header must declare id, name and observation count",
            ));
        }

        let declared_count = fields[2].parse::<usize>().map_err(|_| {
            TrackError::invalid_format(
                HURDAT_SOURCE_NAME,
                line_number,
                format!("invalid observation count '{}'", fields[2]),
            )
        })?;

        Ok(StormHeader {
            id: fields[0].to_string(),
            name: fields[1].to_string(),
            basin: self.basin.clone(),
            source: self.source,
            declared_count: Some(declared_count),
            provisional: false,
        })
    }

    fn parse_observation(&self, line_number: usize, line: &str) -> Result<Observation> {
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < MIN_OBSERVATION_FIELDS {
            return Err(TrackError::invalid_format(
                HURDAT_SOURCE_NAME,
                line_number,
                format!(
                    "observation needs {} fields, found {}",
                    MIN_OBSERVATION_FIELDS,
                    fields.len()
                ),
            ));
        }

        let time = parse_timestamp(fields[0], fields[1])?;
        let lat = parse_latitude(fields[4])?;
        let lon = parse_longitude(fields[5])?;

        Ok(Observation {
            time,
            lat,
            lon,
            wind: parse_measurement(fields[6]),
            pressure: parse_measurement(fields[7]),
            nature: fields[3].trim().to_string(),
        })
    }
}

impl TrackParser for HurdatParser {
    fn source(&self) -> Source {
        self.source
    }

    fn parse(&self, text: &str) -> Result<ParsedSource> {
        let mut storms = Vec::new();
        let mut stats = ParseStats::default();
        let mut lines = text
            .lines()
            .enumerate()
            .map(|(index, line)| (index + 1, line))
            .filter(|(_, line)| !line.trim().is_empty());

        while let Some((line_number, line)) = lines.next() {
            let header = self.parse_header(line_number, line)?;
            let declared = header.declared_count.unwrap_or_default();
            let mut observations = Vec::with_capacity(declared);
            let mut consumed = 0;

            while consumed < declared {
                let Some((obs_line_number, obs_line)) = lines.next() else {
                    break;
                };
                consumed += 1;

                match self.parse_observation(obs_line_number, obs_line) {
                    Ok(observation) => observations.push(observation),
                    Err(error) if error.is_record_level() => {
                        debug!(
                            "Skipping {} line {} of storm {}: {}",
                            HURDAT_SOURCE_NAME, obs_line_number, header.id, error
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

            if consumed < declared {
                warn!(
                    "Storm {} is truncated: {} of {} declared observation lines present",
                    header.id, consumed, declared
                );
            }

            storms.push(StormRecord {
                header,
                observations,
            });
        }

        debug!(
            "Parsed {} storms from {} ({} coordinate errors, {} timestamp errors)",
            storms.len(),
            self.source,
            stats.coordinate_errors,
            stats.timestamp_errors
        );

        Ok(ParsedSource {
            source: self.source,
            storms,
            stats,
        })
    }
}

/// Combine the YYYYMMDD date field and the marker-prefixed HHMM time field
fn parse_timestamp(date_field: &str, time_field: &str) -> Result<DateTime<Utc>> {
    let date = date_field.trim();
    let time = time_field.trim();
    let time = time
        .len()
        .checked_sub(4)
        .and_then(|start| time.get(start..))
        .unwrap_or(time);

    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), HURDAT_DATETIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| TrackError::InvalidTimestamp {
            value: format!("{}{}", date_field, time_field),
        })
}

/// Split a coordinate into its magnitude and trailing hemisphere letter
fn split_hemisphere(field: &str) -> Result<(f64, char)> {
    let trimmed = field.trim();
    let hemisphere = trimmed
        .chars()
        .last()
        .ok_or_else(|| TrackError::InvalidCoordinate {
            value: field.to_string(),
        })?;
    let magnitude = trimmed[..trimmed.len() - hemisphere.len_utf8()]
        .trim()
        .parse::<f64>()
        .map_err(|_| TrackError::InvalidCoordinate {
            value: field.to_string(),
        })?;
    Ok((magnitude, hemisphere))
}

pub(crate) fn parse_latitude(field: &str) -> Result<f64> {
    match split_hemisphere(field)? {
        (magnitude, 'N') => Ok(magnitude),
        (magnitude, 'S') => Ok(-magnitude),
        _ => Err(TrackError::InvalidHemisphere {
            value: field.trim().to_string(),
        }),
    }
}

pub(crate) fn parse_longitude(field: &str) -> Result<f64> {
    match split_hemisphere(field)? {
        (magnitude, 'E') if magnitude > 180.0 => Ok(magnitude - 360.0),
        (magnitude, 'E') => Ok(magnitude),
        (magnitude, 'W') if -magnitude < -180.0 => Ok(360.0 - magnitude),
        (magnitude, 'W') => Ok(-magnitude),
        _ => Err(TrackError::InvalidHemisphere {
            value: field.trim().to_string(),
        }),
    }
}
