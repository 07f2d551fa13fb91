//! ENSO phase classification from a monthly sea-surface anomaly series.
//!
//! The anomaly series is smoothed with a centered 3-month running mean,
//! thresholded at ±0.5 and then filtered so that only runs of at least five
//! consecutive warm or cold months are tagged. Every other month in the
//! series is neutral; months outside the series are unknown.

use crate::constants::{PHASE_KEY_FORMAT, PHASE_MIN_DURATION, PHASE_THRESHOLD};
use crate::error::{Result, TrackError};
use crate::models::ClimatePhase;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

const ENSO_SOURCE_NAME: &str = "ENSO anomaly";

/// Column of the detrended anomaly in the CPC text layout
const ANOMALY_COLUMN: usize = 4;

/// One month of the anomaly series
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthlyAnomaly {
    pub year: i32,
    pub month: u32,
    pub anomaly: f64,
}

impl MonthlyAnomaly {
    pub fn new(year: i32, month: u32, anomaly: f64) -> Self {
        Self {
            year,
            month,
            anomaly,
        }
    }

    pub fn key(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

/// Parse the CPC `detrend.nino34.ascii.txt` layout.
///
/// The first line is a header; every following line with more than one
/// whitespace-separated token is `YR MON TOTAL ClimAdjust ANOM`.
pub fn parse_anomaly_series(text: &str) -> Result<Vec<MonthlyAnomaly>> {
    let mut series = Vec::new();

    for (index, line) in text.lines().enumerate().skip(1) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() <= 1 {
            continue;
        }
        let line_number = index + 1;

        if fields.len() <= ANOMALY_COLUMN {
            return Err(TrackError::invalid_format(
                ENSO_SOURCE_NAME,
                line_number,
                format!("expected {} columns, found {}", ANOMALY_COLUMN + 1, fields.len()),
            ));
        }

        let year = fields[0].parse::<i32>().map_err(|_| {
            TrackError::invalid_format(ENSO_SOURCE_NAME, line_number, "invalid year")
        })?;
        let month = fields[1]
            .parse::<u32>()
            .ok()
            .filter(|m| (1..=12).contains(m))
            .ok_or_else(|| {
                TrackError::invalid_format(ENSO_SOURCE_NAME, line_number, "invalid month")
            })?;
        let anomaly = fields[ANOMALY_COLUMN].parse::<f64>().map_err(|_| {
            TrackError::invalid_format(ENSO_SOURCE_NAME, line_number, "invalid anomaly value")
        })?;

        series.push(MonthlyAnomaly::new(year, month, anomaly));
    }

    debug!("Parsed {} months of ENSO anomalies", series.len());
    Ok(series)
}

/// Centered 3-month running mean with 2-month means at the boundaries.
///
/// Interior means are rounded to one decimal the way the published Oceanic
/// Niño Index is.
pub fn running_mean(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    match n {
        0 => Vec::new(),
        1 => values.to_vec(),
        _ => (0..n)
            .map(|k| {
                if k == 0 {
                    (values[0] + values[1]) / 2.0
                } else if k == n - 1 {
                    (values[n - 2] + values[n - 1]) / 2.0
                } else {
                    round_one_decimal((values[k - 1] + values[k] + values[k + 1]) / 3.0)
                }
            })
            .collect(),
    }
}

/// Round through the shortest decimal so ties follow the stored binary value
fn round_one_decimal(value: f64) -> f64 {
    format!("{:.1}", value).parse().unwrap_or(value)
}

/// Threshold a smoothed value into -1, 0 or +1
pub fn threshold(value: f64) -> i32 {
    if value >= PHASE_THRESHOLD {
        1
    } else if value <= -PHASE_THRESHOLD {
        -1
    } else {
        0
    }
}

/// Classify every month of a series into warm, cold or neutral
pub fn classify_series(values: &[f64]) -> Vec<ClimatePhase> {
    let n = values.len();
    let states: Vec<i32> = running_mean(values).into_iter().map(threshold).collect();
    let mut phases = vec![ClimatePhase::Neutral; n];

    let half = PHASE_MIN_DURATION / 2;
    if n >= PHASE_MIN_DURATION {
        for centre in half..=(n - 1 - half) {
            let window = centre - half..=centre + half;
            let sum: i32 = states[window.clone()].iter().sum();
            let phase = if sum == PHASE_MIN_DURATION as i32 {
                ClimatePhase::Warm
            } else if sum == -(PHASE_MIN_DURATION as i32) {
                ClimatePhase::Cold
            } else {
                continue;
            };
            for month in &mut phases[window] {
                *month = phase;
            }
        }
    }

    phases
}

/// Month to ENSO phase lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClimateLookup {
    phases: HashMap<String, ClimatePhase>,
}

impl ClimateLookup {
    /// Build the lookup from a chronologically ordered anomaly series
    pub fn from_series(series: &[MonthlyAnomaly]) -> Self {
        let values: Vec<f64> = series.iter().map(|sample| sample.anomaly).collect();
        let phases = series
            .iter()
            .map(MonthlyAnomaly::key)
            .zip(classify_series(&values))
            .collect();
        Self { phases }
    }

    /// Parse CPC anomaly text and build the lookup
    pub fn from_text(text: &str) -> Result<Self> {
        let series = parse_anomaly_series(text)?;
        Ok(Self::from_series(&series))
    }

    /// Phase of a "YYYY-MM" month; months outside the series are unknown
    pub fn phase(&self, key: &str) -> ClimatePhase {
        self.phases
            .get(key)
            .copied()
            .unwrap_or(ClimatePhase::Unknown)
    }

    pub fn phase_at(&self, time: &DateTime<Utc>) -> ClimatePhase {
        self.phase(&time.format(PHASE_KEY_FORMAT).to_string())
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}
