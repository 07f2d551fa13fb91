//! Main processing engine.
//!
//! Sequences parsing, storm building, classification, deduplication,
//! geometry and emission to a [`TrackSink`], keeping the QA counters up to
//! date along the way. Parsing may run concurrently; every later stage is
//! single-threaded and sees the storms of all sources at once.

pub mod discovery;
pub mod sink;
pub mod writer;

#[cfg(test)]
pub mod tests;

use self::discovery::{SourcePaths, SourceTexts, read_sources};
use self::sink::{SegmentAttributes, TrackAttributes, TrackSink};

use crate::builder::StormBuilder;
use crate::climate::ClimateLookup;
use crate::config::TrackConfig;
use crate::constants::MISSING_VALUE;
use crate::dedup::Deduplicator;
use crate::error::{Result, TrackError};
use crate::geometry::GeometryProcessor;
use crate::intensity;
use crate::lookups::{Crosswalk, Lookups, ReportIndex};
use crate::models::{Category, ProcessingStats, Source, Storm};
use crate::parser::{HurdatParser, IbtracsParser, ParsedSource, TrackParser};

use chrono::Datelike;
use colored::*;
use futures::future::try_join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};
use tokio::task;
use tracing::{debug, info};

/// Result of one pipeline run
#[derive(Debug, Clone, Default)]
pub struct ProcessingOutcome {
    pub stats: ProcessingStats,
    /// Provisional storms set aside instead of emitted
    pub provisional: Vec<Storm>,
}

/// Build the lookup tables from whichever lookup files were read
pub fn load_lookups(texts: &SourceTexts) -> Result<Lookups> {
    let climate = match &texts.enso {
        Some(text) => ClimateLookup::from_text(text)?,
        None => ClimateLookup::default(),
    };
    let mut lookups = Lookups::new(climate);

    if let Some(text) = &texts.reports {
        lookups = lookups.with_reports(ReportIndex::parse(text)?);
    }
    if let Some(text) = &texts.crosswalk {
        lookups = lookups.with_crosswalk(Crosswalk::parse(text));
    }

    debug!(
        "Loaded lookups: {} climate months, {} report urls, crosswalk {}",
        lookups.climate.len(),
        lookups.reports.len(),
        lookups
            .crosswalk
            .as_ref()
            .map_or("absent".to_string(), |c| format!("with {} keys", c.len()))
    );
    Ok(lookups)
}

/// Set segment categories and phases plus the storm-level aggregates
pub fn classify_storm(storm: &mut Storm, climate: &ClimateLookup) {
    let mut max_wind = MISSING_VALUE;
    let mut min_pressure = MISSING_VALUE;
    let mut max_category = Category::NotRated;

    for segment in &mut storm.segments {
        let observation = &segment.observation;
        let category = intensity::classify_observation(observation);
        segment.category = Some(category);
        segment.phase = Some(climate.phase_at(&observation.time));

        // First segment reaching the peak wind sets the storm category
        if observation.has_wind() && observation.wind > max_wind {
            max_wind = observation.wind;
            max_category = category;
        }
        if observation.has_pressure()
            && (min_pressure == MISSING_VALUE || observation.pressure < min_pressure)
        {
            min_pressure = observation.pressure;
        }
    }

    storm.max_wind = max_wind;
    storm.min_pressure = min_pressure;
    storm.max_category = max_category;
    storm.genesis_phase = climate.phase_at(&storm.start_time);
}

/// Processor running the track pipeline with one configuration
#[derive(Debug)]
pub struct TrackProcessor {
    config: TrackConfig,
    lookups: Lookups,
}

impl TrackProcessor {
    /// Create a processor; fails if the configuration is invalid
    pub fn new(config: TrackConfig, lookups: Lookups) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, lookups })
    }

    pub fn config(&self) -> &TrackConfig {
        &self.config
    }

    pub fn lookups(&self) -> &Lookups {
        &self.lookups
    }

    /// Parser for one source, configured from the processor settings
    pub fn parser_for(&self, source: Source) -> Box<dyn TrackParser> {
        match source {
            Source::Ibtracs => Box::new(
                IbtracsParser::new().with_off_synoptic_filter(self.config.filter_off_synoptic),
            ),
            Source::HurdatAtlantic => Box::new(HurdatParser::atlantic()),
            Source::HurdatPacific => Box::new(HurdatParser::pacific()),
        }
    }

    /// Parse one source synchronously
    pub fn parse_text(&self, source: Source, text: &str) -> Result<ParsedSource> {
        self.parser_for(source).parse(text)
    }

    /// Parse every source on the blocking pool, concurrently
    pub async fn parse_sources(&self, inputs: Vec<(Source, String)>) -> Result<Vec<ParsedSource>> {
        let handles = inputs.into_iter().map(|(source, text)| {
            let parser = self.parser_for(source);
            async move {
                task::spawn_blocking(move || parser.parse(&text))
                    .await
                    .map_err(|e| TrackError::Interrupted {
                        reason: format!("Parser task for {} failed: {}", source, e),
                    })?
            }
        });

        try_join_all(handles).await
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }

    /// Run every stage after parsing and emit the results to `sink`
    pub fn process(
        &self,
        sources: Vec<ParsedSource>,
        sink: &mut dyn TrackSink,
    ) -> Result<ProcessingOutcome> {
        let start_time = Instant::now();
        let progress = self.progress_bar();
        let stage = |message: &'static str| {
            if let Some(pb) = &progress {
                pb.set_message(message);
            }
        };
        let mut stats = ProcessingStats::new();
        let mut storms = Vec::new();
        let mut provisional = Vec::new();

        stage("Building storms");
        let builder = StormBuilder::new(self.config.provisional_policy);
        for parsed in sources {
            stats.sources_processed += 1;
            stats.coordinate_errors += parsed.stats.coordinate_errors;
            stats.timestamp_errors += parsed.stats.timestamp_errors;
            stats.off_synoptic_dropped += parsed.stats.off_synoptic_dropped;

            let built = builder.build(parsed.storms);
            match parsed.source {
                Source::Ibtracs => stats.ibtracs_storms += built.ingested,
                Source::HurdatAtlantic => stats.hurdat_atlantic_storms += built.ingested,
                Source::HurdatPacific => stats.hurdat_pacific_storms += built.ingested,
            }
            stats.single_point_storms += built.single_point;
            stats.provisional_omitted += built.provisional_omitted;
            stats.count_mismatches += built.count_mismatches;

            debug!(
                "{}: {} storms kept, {} single-point",
                parsed.source,
                built.storms.len(),
                built.single_point
            );
            storms.extend(built.storms);
            provisional.extend(built.provisional);
        }
        stats.multi_observation_storms = storms.len();

        stage("Classifying intensity and climate phase");
        for storm in storms.iter_mut().chain(provisional.iter_mut()) {
            classify_storm(storm, &self.lookups.climate);
        }

        stage("Resolving duplicates");
        let deduplicator = Deduplicator::new(self.config.source_preference, self.config.dedup_window);
        let outcome = deduplicator.deduplicate(storms, self.lookups.crosswalk.as_ref());
        stats.duplicates_resolved = outcome.duplicates;
        stats.unique_storms = outcome.storms.len();

        stage("Building geometry");
        let geometry = GeometryProcessor::new(&self.config);
        for (index, mut storm) in outcome.storms.into_iter().enumerate() {
            stats.degenerate_nudges += geometry.assign_endpoints(&mut storm.segments);

            if storm.has_intensity_data() {
                stats.good_storms += 1;
            } else {
                debug!("{} has no wind or pressure data", storm.display_name);
                stats.storms_without_intensity += 1;
            }

            let rendered = geometry.render(&storm);
            stats.antimeridian_crossings += rendered.crossings;
            stats.projection_errors += rendered.projection_errors;

            for (segment, shape) in storm.segments.iter().zip(&rendered.segments) {
                let Some(shape) = shape else {
                    continue;
                };
                let order = stats.segments_emitted;
                let attributes = SegmentAttributes::from_segment(order + 1, order, &storm, segment);
                sink.emit_segment(shape, &attributes)?;
                stats.segments_emitted += 1;
            }

            let report_url = self
                .lookups
                .reports
                .url_for(&storm.name, storm.start_time.year())
                .map(str::to_string);
            let attributes = TrackAttributes::from_storm(index + 1, &storm, report_url);
            sink.emit_track(&rendered.track, &attributes)?;
            stats.tracks_emitted += 1;
        }

        stage("Finishing output");
        sink.finish()?;

        if let Some(pb) = progress {
            pb.finish_and_clear();
        }

        stats.processing_time_ms = start_time.elapsed().as_millis();
        stats.verify()?;
        info!("{}", stats.summary());

        Ok(ProcessingOutcome { stats, provisional })
    }

    /// Read, parse and process the inputs at `paths`, reporting progress on stdout
    pub async fn run(
        config: TrackConfig,
        paths: &SourcePaths,
        sink: &mut dyn TrackSink,
    ) -> Result<ProcessingOutcome> {
        if !paths.has_track_source() {
            return Err(TrackError::Configuration {
                message: "No HURDAT2 or IBTrACS input available".to_string(),
            });
        }

        println!("{}", "Starting cyclone track processing".bright_green().bold());
        for (label, path) in [
            ("Atlantic:", &paths.hurdat_atlantic),
            ("NE Pacific:", &paths.hurdat_pacific),
            ("IBTrACS:", &paths.ibtracs),
            ("ENSO:", &paths.enso),
            ("Crosswalk:", &paths.crosswalk),
            ("Reports:", &paths.reports),
        ] {
            if let Some(path) = path {
                println!("  {} {}", label.bright_cyan(), path.display());
            }
        }

        println!("\n{}", "Reading inputs...".bright_yellow());
        let mut texts = read_sources(paths).await?;
        let lookups = load_lookups(&texts)?;
        println!(
            "  {} {} climate months, {} report urls",
            "Loaded".bright_green(),
            lookups.climate.len().to_string().bright_white().bold(),
            lookups.reports.len().to_string().bright_white().bold()
        );

        let inputs: Vec<(Source, String)> = [
            (Source::HurdatAtlantic, texts.hurdat_atlantic.take()),
            (Source::HurdatPacific, texts.hurdat_pacific.take()),
            (Source::Ibtracs, texts.ibtracs.take()),
        ]
        .into_iter()
        .filter_map(|(source, text)| text.map(|text| (source, text)))
        .collect();

        let processor = Self::new(config, lookups)?;

        println!("\n{}", "Parsing track archives...".bright_yellow());
        let parsed = processor.parse_sources(inputs).await?;
        for source in &parsed {
            println!(
                "  {} {} storm records from {}",
                "Parsed".bright_green(),
                source.storms.len().to_string().bright_white().bold(),
                source.source
            );
        }

        println!("\n{}", "Processing storms...".bright_yellow());
        let outcome = processor.process(parsed, sink)?;
        print_summary(&outcome.stats);
        Ok(outcome)
    }
}

/// Print the QA counters of a finished run
pub fn print_summary(stats: &ProcessingStats) {
    let line = |label: &str, value: usize| {
        println!("  {} {}", label.bright_cyan(), value.to_string().bright_white());
    };

    println!("\n{}", "Processing Summary".bright_green().bold());
    println!(
        "  {} {}ms",
        "Time elapsed:".bright_cyan(),
        stats.processing_time_ms.to_string().bright_white()
    );
    line("Storms ingested:", stats.storms_ingested());
    line("  IBTrACS:", stats.ibtracs_storms);
    line("  HURDAT2 Atlantic:", stats.hurdat_atlantic_storms);
    line("  HURDAT2 NE Pacific:", stats.hurdat_pacific_storms);
    line("Single-point storms:", stats.single_point_storms);
    line("Duplicates resolved:", stats.duplicates_resolved);
    line("Unique storms:", stats.unique_storms);
    line("Without intensity data:", stats.storms_without_intensity);
    line("Antimeridian crossings:", stats.antimeridian_crossings);
    line("Tracks written:", stats.tracks_emitted);
    line("Segments written:", stats.segments_emitted);

    if stats.provisional_omitted > 0 {
        line("Provisional omitted:", stats.provisional_omitted);
    }
    if stats.record_errors() > 0 {
        println!(
            "  {} {} ({} coordinate, {} timestamp)",
            "Records skipped:".bright_red(),
            stats.record_errors().to_string().bright_red(),
            stats.coordinate_errors,
            stats.timestamp_errors
        );
    }
    if stats.projection_errors > 0 {
        println!(
            "  {} {}",
            "Projection errors:".bright_red(),
            stats.projection_errors.to_string().bright_red()
        );
    }
}
