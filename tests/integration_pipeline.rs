//! Integration tests for the complete track pipeline
//!
//! Lays out a data directory the way the input archives are distributed,
//! runs discovery and processing end to end and reads the Parquet output
//! back.

use cyclone_tracks::processor::discovery::{SourceDiscovery, read_sources};
use cyclone_tracks::processor::load_lookups;
use cyclone_tracks::{ParquetSink, TrackConfig, TrackProcessor};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tempfile::TempDir;

const ATLANTIC: &str = "\
AL122005,            KATRINA,      5,
20050823, 1800,  , TD, 23.1N,  75.1W,  30, 1008,
20050824, 0000,  , TD, 23.4N,  75.7W,  30, 1007,
20050824, 0600,  , TS, 23.8N,  76.2W,  35, 1007,
20050825, 1800,  , HU, 26.0N,  79.0W,  70,  984,
20050829, 1200,  , HU, 29.5N,  89.6W, 110,  920,
AL132005,                LEE,      2,
20050828, 1800,  , TD, 10.8N,  35.0W,  30, 1009,
20050829, 0000,  , TS, 11.2N,  36.1W,  35, 1007,
";

const PACIFIC: &str = "\
EP172015,               IGOR,      2,
20150901, 0000,  , HU, 20.0N, 178.0W, 100,  950,
20150901, 0600,  , HU, 20.5N, 179.5E,  95,  955,
";

const ENSO: &str = "\
 YR   MON  TOTAL ClimAdjust ANOM
 2005   1  27.01  26.65   0.36
 2005   2  27.21  26.77   0.44
 2005   3  27.69  27.26   0.43
 2005   4  28.14  27.81   0.33
 2005   5  28.27  28.05   0.22
 2005   6  28.05  27.91   0.14
 2005   7  27.57  27.55   0.02
 2005   8  27.03  27.10  -0.07
 2005   9  26.77  26.83  -0.06
 2005  10  26.48  26.70  -0.22
 2005  11  26.18  26.64  -0.46
 2005  12  25.85  26.55  -0.70
";

const REPORTS: &str = "\
Hurricane Katrina,2005,https://www.nhc.noaa.gov/data/tcr/AL122005_Katrina.pdf
";

fn write_data_dir(dir: &Path) {
    fs::write(dir.join("hurdat2-1851-2023-051124.txt"), ATLANTIC).unwrap();
    fs::write(dir.join("hurdat2-nepac-1949-2023-042624.txt"), PACIFIC).unwrap();
    fs::write(dir.join("detrend.nino34.ascii.txt"), ENSO).unwrap();
    fs::write(dir.join("storm_reports.txt"), REPORTS).unwrap();
}

fn read_frame(path: &Path) -> DataFrame {
    ParquetReader::new(File::open(path).unwrap()).finish().unwrap()
}

#[tokio::test]
async fn test_end_to_end_parquet_output() {
    let temp_dir = TempDir::new().unwrap();
    write_data_dir(temp_dir.path());
    let output_dir = temp_dir.path().join("output");

    let paths = SourceDiscovery::new(temp_dir.path().to_path_buf())
        .discover()
        .unwrap();
    assert!(paths.ibtracs.is_none());
    assert!(paths.reports.is_some());

    let mut sink = ParquetSink::new(&output_dir);
    let outcome = TrackProcessor::run(TrackConfig::default(), &paths, &mut sink)
        .await
        .unwrap();

    let stats = &outcome.stats;
    assert_eq!(stats.storms_ingested(), 3);
    assert_eq!(stats.unique_storms, 3);
    assert_eq!(stats.tracks_emitted, 3);
    assert_eq!(stats.segments_emitted, 9);
    assert_eq!(stats.antimeridian_crossings, 1);

    let tracks = read_frame(&sink.tracks_path());
    assert_eq!(tracks.height(), 3);

    let names = tracks.column("display_name").unwrap().str().unwrap();
    let katrina = (0..tracks.height())
        .find(|&i| names.get(i) == Some("KATRINA 2005"))
        .unwrap();

    let max_category = tracks.column("max_category").unwrap().str().unwrap();
    assert_eq!(max_category.get(katrina), Some("H3"));
    let report_url = tracks.column("report_url").unwrap().str().unwrap();
    assert!(report_url.get(katrina).unwrap().ends_with("AL122005_Katrina.pdf"));
    let geometry = tracks.column("geometry").unwrap().str().unwrap();
    assert!(geometry.get(katrina).unwrap().starts_with("MULTILINESTRING"));

    let segments = read_frame(&sink.segments_path());
    assert_eq!(segments.height(), 9);
    let order = segments.column("segment_order").unwrap().u64().unwrap();
    assert_eq!(order.get(0), Some(0));
    assert_eq!(order.get(8), Some(8));
}

#[tokio::test]
async fn test_lookups_from_data_dir() {
    let temp_dir = TempDir::new().unwrap();
    write_data_dir(temp_dir.path());

    let paths = SourceDiscovery::new(temp_dir.path().to_path_buf())
        .discover()
        .unwrap();
    let texts = read_sources(&paths).await.unwrap();
    let lookups = load_lookups(&texts).unwrap();

    assert_eq!(lookups.climate.len(), 12);
    assert_eq!(lookups.reports.len(), 1);
    assert!(lookups.crosswalk.is_none());
}
