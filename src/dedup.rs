//! Cross-source duplicate resolution.
//!
//! The same physical storm usually appears in both IBTrACS and HURDAT2.
//! With a crosswalk the storms are matched on (canonical id, basin); without
//! one, storms are matched by name against a short window of recently
//! accepted storms. Either way exactly one record per storm survives and the
//! survivor is chosen by [`SourcePreference`].

use crate::config::SourcePreference;
use crate::constants::is_generic_name;
use crate::lookups::Crosswalk;
use crate::models::Storm;
use tracing::debug;

/// Surviving storms and the number of duplicates folded into them
#[derive(Debug, Default)]
pub struct DedupOutcome {
    pub storms: Vec<Storm>,
    pub duplicates: usize,
}

#[derive(Debug, Clone)]
pub struct Deduplicator {
    preference: SourcePreference,
    window: usize,
}

impl Deduplicator {
    pub fn new(preference: SourcePreference, window: usize) -> Self {
        Self { preference, window }
    }

    /// Resolve duplicates, using the crosswalk when one is available
    pub fn deduplicate(&self, storms: Vec<Storm>, crosswalk: Option<&Crosswalk>) -> DedupOutcome {
        match crosswalk {
            Some(crosswalk) => self.by_crosswalk(storms, crosswalk),
            None => self.by_name(storms),
        }
    }

    /// Whether `candidate` should wholesale replace `incumbent`
    fn replaces(&self, incumbent: &Storm, candidate: &Storm) -> bool {
        self.preference.prefers(candidate.source.is_regional())
            && !self.preference.prefers(incumbent.source.is_regional())
    }

    /// Match on (canonical id, basin) after mapping ids through the crosswalk
    pub fn by_crosswalk(&self, mut storms: Vec<Storm>, crosswalk: &Crosswalk) -> DedupOutcome {
        for storm in &mut storms {
            if let Some(canonical_id) = crosswalk.canonical_id(&storm.source_id) {
                storm.canonical_id = canonical_id.to_string();
            }
        }

        storms.sort_by(|a, b| {
            a.canonical_id
                .cmp(&b.canonical_id)
                .then_with(|| a.basin.cmp(&b.basin))
                .then_with(|| a.source.rank().cmp(&b.source.rank()))
        });

        let mut accepted: Vec<Storm> = Vec::with_capacity(storms.len());
        let mut duplicates = 0;

        for storm in storms {
            match accepted.last_mut() {
                Some(last) if last.identity() == storm.identity() => {
                    duplicates += 1;
                    debug!(
                        "Duplicate {} ({}) matches {} ({})",
                        storm.source_id, storm.source, last.source_id, last.source
                    );
                    if self.replaces(last, &storm) {
                        *last = storm;
                    }
                }
                _ => accepted.push(storm),
            }
        }

        DedupOutcome {
            storms: accepted,
            duplicates,
        }
    }

    /// Match by name (or start time for generic names) in time order
    pub fn by_name(&self, mut storms: Vec<Storm>) -> DedupOutcome {
        storms.sort_by_key(|storm| storm.start_time);

        let mut accepted: Vec<Storm> = Vec::with_capacity(storms.len());
        let mut duplicates = 0;

        for mut storm in storms {
            let lookback = self.window.min(accepted.len());
            let matched = (accepted.len() - lookback..accepted.len())
                .rev()
                .find(|&index| is_name_match(&accepted[index], &storm));

            let Some(index) = matched else {
                accepted.push(storm);
                continue;
            };

            duplicates += 1;
            let incumbent = &accepted[index];
            debug!(
                "Duplicate {} '{}' ({}) matches {} '{}' ({})",
                storm.source_id,
                storm.name,
                storm.source,
                incumbent.source_id,
                incumbent.name,
                incumbent.source
            );

            if self.replaces(incumbent, &storm) {
                if storm.source.is_regional() && !incumbent.source.is_regional() {
                    storm.canonical_id = incumbent.canonical_id.clone();
                }
                accepted[index] = storm;
            }
        }

        DedupOutcome {
            storms: accepted,
            duplicates,
        }
    }
}

/// Name-based duplicate test between an accepted storm and a candidate
fn is_name_match(accepted: &Storm, candidate: &Storm) -> bool {
    if accepted.source == candidate.source || accepted.basin != candidate.basin {
        return false;
    }

    if is_generic_name(&accepted.name) || is_generic_name(&candidate.name) {
        return accepted.start_time == candidate.start_time;
    }

    let a = accepted.name.trim().to_uppercase();
    let b = candidate.name.trim().to_uppercase();
    a.contains(&b) || b.contains(&a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, ClimatePhase, Source};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::HashSet;

    fn storm(id: &str, name: &str, basin: &str, source: Source, day: u32) -> Storm {
        let start_time = Utc.with_ymd_and_hms(2005, 8, day, 0, 0, 0).unwrap();
        Storm {
            source_id: id.to_string(),
            canonical_id: id.to_string(),
            name: name.to_string(),
            display_name: format!("{} 2005", name),
            basin: basin.to_string(),
            source,
            provisional: false,
            segments: Vec::new(),
            segment_count: 0,
            start_time,
            end_time: start_time + Duration::days(5),
            max_wind: 100.0,
            min_pressure: 950.0,
            max_category: Category::H3,
            genesis_phase: ClimatePhase::Neutral,
        }
    }

    fn crosswalk() -> Crosswalk {
        let mut crosswalk = Crosswalk::new();
        crosswalk.insert("AL122005", "2005236N23285");
        crosswalk.insert("AL132005", "2005240N11325");
        crosswalk
    }

    fn mixed_storms() -> Vec<Storm> {
        vec![
            storm("2005236N23285", "KATRINA", "NA", Source::Ibtracs, 23),
            storm("AL122005", "KATRINA", "NA", Source::HurdatAtlantic, 23),
            storm("2005240N11325", "LEE", "NA", Source::Ibtracs, 28),
            storm("AL132005", "LEE", "NA", Source::HurdatAtlantic, 28),
            storm("2005200N15140", "BANYAN", "WP", Source::Ibtracs, 20),
        ]
    }

    #[test]
    fn test_crosswalk_prefers_regional() {
        let dedup = Deduplicator::new(SourcePreference::PreferRegional, 5);
        let outcome = dedup.deduplicate(mixed_storms(), Some(&crosswalk()));

        assert_eq!(outcome.storms.len(), 3);
        assert_eq!(outcome.duplicates, 2);
        let katrina = outcome
            .storms
            .iter()
            .find(|s| s.name == "KATRINA")
            .unwrap();
        assert_eq!(katrina.source, Source::HurdatAtlantic);
        assert_eq!(katrina.canonical_id, "2005236N23285");
        assert_eq!(katrina.source_id, "AL122005");
    }

    #[test]
    fn test_crosswalk_prefers_global() {
        let dedup = Deduplicator::new(SourcePreference::PreferGlobal, 5);
        let outcome = dedup.deduplicate(mixed_storms(), Some(&crosswalk()));
        assert_eq!(outcome.storms.len(), 3);
        assert!(outcome.storms.iter().all(|s| s.source == Source::Ibtracs));
    }

    #[test]
    fn test_crosswalk_identities_are_unique() {
        let mut storms = mixed_storms();
        storms.push(storm("2005236N23285", "KATRINA", "NA", Source::Ibtracs, 23));
        storms.push(storm("2005236N23285", "KATRINA", "EP", Source::Ibtracs, 23));
        let total = storms.len();

        let outcome = Deduplicator::new(SourcePreference::PreferRegional, 5)
            .deduplicate(storms, Some(&crosswalk()));

        let identities: HashSet<(&str, &str)> =
            outcome.storms.iter().map(Storm::identity).collect();
        assert_eq!(identities.len(), outcome.storms.len());
        assert_eq!(outcome.storms.len() + outcome.duplicates, total);
        // Same id in another basin survives
        assert!(outcome.storms.iter().any(|s| s.basin == "EP"));
    }

    #[test]
    fn test_name_fallback() {
        let dedup = Deduplicator::new(SourcePreference::PreferRegional, 5);
        let storms = vec![
            storm("2005236N23285", "KATRINA:TWELVE", "NA", Source::Ibtracs, 23),
            storm("AL122005", "KATRINA", "NA", Source::HurdatAtlantic, 24),
            storm("2005240N11325", "LEE", "NA", Source::Ibtracs, 28),
        ];
        let outcome = dedup.deduplicate(storms, None);

        assert_eq!(outcome.storms.len(), 2);
        assert_eq!(outcome.duplicates, 1);
        let katrina = &outcome.storms[0];
        assert_eq!(katrina.source, Source::HurdatAtlantic);
        assert_eq!(katrina.canonical_id, "2005236N23285");
    }

    #[test]
    fn test_name_fallback_skips_same_source_and_basin() {
        let dedup = Deduplicator::new(SourcePreference::PreferRegional, 5);
        let storms = vec![
            storm("2005236N23285", "LIN", "WP", Source::Ibtracs, 23),
            storm("2005237N23285", "CAROLINE", "WP", Source::Ibtracs, 23),
            storm("AL122005", "CAROLINE", "NA", Source::HurdatAtlantic, 23),
        ];
        let outcome = dedup.deduplicate(storms, None);
        assert_eq!(outcome.storms.len(), 3);
        assert_eq!(outcome.duplicates, 0);
    }

    #[test]
    fn test_generic_names_require_equal_start() {
        let dedup = Deduplicator::new(SourcePreference::PreferRegional, 5);
        let storms = vec![
            storm("1900001N20300", "NOT_NAMED", "NA", Source::Ibtracs, 10),
            storm("AL011900", "UNNAMED", "NA", Source::HurdatAtlantic, 11),
            storm("1900002N20300", "NOT_NAMED", "NA", Source::Ibtracs, 15),
            storm("AL021900", "UNNAMED", "NA", Source::HurdatAtlantic, 15),
        ];
        let outcome = dedup.deduplicate(storms, None);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.storms.len(), 3);
    }

    #[test]
    fn test_window_bounds_comparisons() {
        let dedup = Deduplicator::new(SourcePreference::PreferRegional, 1);
        let storms = vec![
            storm("2005236N23285", "KATRINA", "NA", Source::Ibtracs, 20),
            storm("2005237N23285", "LEE", "NA", Source::Ibtracs, 21),
            storm("AL122005", "KATRINA", "NA", Source::HurdatAtlantic, 22),
        ];
        let outcome = dedup.deduplicate(storms, None);
        assert_eq!(outcome.duplicates, 0);
        assert_eq!(outcome.storms.len(), 3);
    }
}
