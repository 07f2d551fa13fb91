//! Storm assembly from parsed records.
//!
//! Orders each storm's observations by time, applies the provisional-record
//! policy, drops single-observation storms and builds display names.

use crate::config::ProvisionalPolicy;
use crate::constants::PROVISIONAL_MARKER;
use crate::models::{Segment, Storm, unset_aggregates};
use crate::parser::StormRecord;
use chrono::Datelike;
use tracing::{debug, warn};

/// Storms built from one batch of parsed records
#[derive(Debug, Default)]
pub struct BuildOutput {
    /// Storms with at least two observations
    pub storms: Vec<Storm>,
    /// Provisional storms set aside under [`ProvisionalPolicy::Omit`]
    pub provisional: Vec<Storm>,
    /// Storms that entered the length check
    pub ingested: usize,
    pub single_point: usize,
    pub provisional_omitted: usize,
    pub count_mismatches: usize,
}

/// Groups observations into storms with ordered segments
#[derive(Debug, Clone)]
pub struct StormBuilder {
    policy: ProvisionalPolicy,
}

impl StormBuilder {
    pub fn new(policy: ProvisionalPolicy) -> Self {
        Self { policy }
    }

    pub fn build(&self, records: Vec<StormRecord>) -> BuildOutput {
        let mut output = BuildOutput::default();

        for mut record in records {
            record.observations.sort_by_key(|observation| observation.time);

            if let Some(declared) = record.header.declared_count {
                if declared != record.observations.len() {
                    warn!(
                        "Storm {} declares {} observations but {} were read",
                        record.header.id,
                        declared,
                        record.observations.len()
                    );
                    output.count_mismatches += 1;
                }
            }

            if record.header.provisional && self.policy == ProvisionalPolicy::Omit {
                debug!("Setting aside provisional storm {}", record.header.id);
                output.provisional_omitted += 1;
                output.provisional.extend(self.assemble(record));
                continue;
            }

            output.ingested += 1;
            if record.observations.len() < 2 {
                debug!(
                    "Excluding single-point storm {} ({} observations)",
                    record.header.id,
                    record.observations.len()
                );
                output.single_point += 1;
                continue;
            }

            output.storms.extend(self.assemble(record));
        }

        output
    }

    /// Turn a record into a storm; `None` when it has no observations
    fn assemble(&self, record: StormRecord) -> Option<Storm> {
        let start_time = record.observations.first()?.time;
        let end_time = record.observations.last()?.time;
        let header = record.header;

        let mut display_name = format!("{} {}", header.name, start_time.year());
        if header.provisional && self.policy == ProvisionalPolicy::Label {
            display_name.push(' ');
            display_name.push_str(PROVISIONAL_MARKER);
        }

        let segments: Vec<Segment> = record.observations.into_iter().map(Segment::new).collect();
        let (max_wind, min_pressure, max_category, genesis_phase) = unset_aggregates();

        Some(Storm {
            canonical_id: header.id.clone(),
            source_id: header.id,
            name: header.name,
            display_name,
            basin: header.basin,
            source: header.source,
            provisional: header.provisional,
            segment_count: segments.len(),
            segments,
            start_time,
            end_time,
            max_wind,
            min_pressure,
            max_category,
            genesis_phase,
        })
    }
}

impl Default for StormBuilder {
    fn default() -> Self {
        Self::new(ProvisionalPolicy::Label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Observation, Source};
    use crate::parser::StormHeader;
    use chrono::{TimeZone, Utc};

    fn observation(hour: u32, lat: f64) -> Observation {
        Observation {
            time: Utc.with_ymd_and_hms(2018, 9, 10, hour, 0, 0).unwrap(),
            lat,
            lon: -60.0,
            wind: 50.0,
            pressure: 995.0,
            nature: "TS".to_string(),
        }
    }

    fn record(id: &str, provisional: bool, observations: Vec<Observation>) -> StormRecord {
        StormRecord {
            header: StormHeader {
                id: id.to_string(),
                name: "FLORENCE".to_string(),
                basin: "NA".to_string(),
                source: Source::HurdatAtlantic,
                declared_count: Some(observations.len()),
                provisional,
            },
            observations,
        }
    }

    #[test]
    fn test_sorts_and_counts_segments() {
        let output = StormBuilder::default().build(vec![record(
            "AL062018",
            false,
            vec![observation(12, 3.0), observation(0, 1.0), observation(6, 2.0)],
        )]);

        assert_eq!(output.storms.len(), 1);
        let storm = &output.storms[0];
        assert_eq!(storm.segment_count, storm.segments.len());
        assert_eq!(storm.segment_count, 3);
        let lats: Vec<f64> = storm.segments.iter().map(|s| s.observation.lat).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0]);
        assert_eq!(storm.start_time, storm.segments[0].observation.time);
        assert_eq!(storm.end_time, storm.segments[2].observation.time);
        assert_eq!(storm.display_name, "FLORENCE 2018");
        assert_eq!(storm.canonical_id, "AL062018");
    }

    #[test]
    fn test_stable_sort_for_equal_times() {
        let output = StormBuilder::default().build(vec![record(
            "AL062018",
            false,
            vec![observation(6, 1.0), observation(6, 2.0), observation(0, 0.0)],
        )]);
        let lats: Vec<f64> = output.storms[0]
            .segments
            .iter()
            .map(|s| s.observation.lat)
            .collect();
        assert_eq!(lats, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_single_point_storms_excluded() {
        let output = StormBuilder::default().build(vec![
            record("AL012018", false, vec![observation(0, 1.0)]),
            record("AL022018", false, vec![]),
            record("AL032018", false, vec![observation(0, 1.0), observation(6, 2.0)]),
        ]);
        assert_eq!(output.ingested, 3);
        assert_eq!(output.single_point, 2);
        assert_eq!(output.storms.len(), 1);
    }

    #[test]
    fn test_provisional_policies() {
        let records = || vec![record("2024150", true, vec![observation(0, 1.0), observation(6, 2.0)])];

        let labelled = StormBuilder::new(ProvisionalPolicy::Label).build(records());
        assert_eq!(labelled.storms[0].display_name, "FLORENCE 2018 (P)");

        let ignored = StormBuilder::new(ProvisionalPolicy::Ignore).build(records());
        assert_eq!(ignored.storms[0].display_name, "FLORENCE 2018");
        assert!(ignored.storms[0].provisional);

        let omitted = StormBuilder::new(ProvisionalPolicy::Omit).build(records());
        assert!(omitted.storms.is_empty());
        assert_eq!(omitted.provisional.len(), 1);
        assert_eq!(omitted.provisional_omitted, 1);
        assert_eq!(omitted.ingested, 0);
    }

    #[test]
    fn test_count_mismatch_is_counted() {
        let mut short = record("AL062018", false, vec![observation(0, 1.0), observation(6, 2.0)]);
        short.header.declared_count = Some(3);
        let output = StormBuilder::default().build(vec![short]);
        assert_eq!(output.count_mismatches, 1);
        assert_eq!(output.storms[0].segment_count, 2);
    }
}
