//! Application constants for cyclone track processing
//!
//! Fixed field layouts, classification thresholds, geometry tolerances and
//! default file patterns used throughout the processor.

// =============================================================================
// Missing Values and Markers
// =============================================================================

/// Sentinel for missing wind speed or pressure
pub const MISSING_VALUE: f64 = -1.0;

/// Marker appended to the display name of provisional storms
pub const PROVISIONAL_MARKER: &str = "(P)";

/// Track type value flagging a provisional IBTrACS storm
pub const PROVISIONAL_FLAG: &str = "PROVISIONAL";

/// Name fragments identifying storms without a real name
pub const GENERIC_NAME_MARKERS: &[&str] = &["UNNAMED", "UNKNOWN", "NOT_NAMED"];

// =============================================================================
// Source Names and Basins
// =============================================================================

pub const IBTRACS_SOURCE_NAME: &str = "IBTrACS";
pub const HURDAT_SOURCE_NAME: &str = "HURDAT2";

/// Basin code for the HURDAT2 North Atlantic archive
pub const ATLANTIC_BASIN: &str = "NA";

/// Basin code for the HURDAT2 North-East Pacific archive
pub const PACIFIC_BASIN: &str = "EP";

// =============================================================================
// IBTrACS Column Layout
// =============================================================================

/// IBTrACS column positions (v04r00 CSV layout)
pub mod ibtracs_columns {
    pub const SID: usize = 0;
    pub const SEASON: usize = 1;
    pub const BASIN: usize = 3;
    pub const NAME: usize = 5;
    pub const ISO_TIME: usize = 6;
    pub const NATURE: usize = 7;
    pub const LAT: usize = 8;
    pub const LON: usize = 9;
    pub const TRACK_TYPE: usize = 13;

    /// Wind columns of the agency (wind, pressure) pairs in priority order.
    /// Each pressure column immediately follows its wind column.
    pub const AGENCY_WIND_COLUMNS: [usize; 15] = [
        23,  // USA
        129, // DS824
        10,  // WMO
        57,  // CMA
        134, // TD9636
        144, // Neumann
        62,  // HKO
        45,  // Tokyo
        95,  // BOM
        138, // TD9635
        149, // MLC
        75,  // Reunion
        124, // Wellington
        120, // Nadi
        67,  // New Delhi
    ];

    /// Number of header rows (names, units) before the first data row
    pub const HEADER_ROWS: usize = 2;
}

/// Observation times (HHMM) dropped from IBTrACS when filtering off-synoptic fixes
pub const OFF_SYNOPTIC_TIMES: [u32; 4] = [300, 900, 1500, 2100];

// =============================================================================
// Intensity Scale
// =============================================================================

/// Lower wind bounds (knots) of the intensity classes
pub mod wind_thresholds {
    pub const TROPICAL_DEPRESSION: f64 = 0.0;
    pub const TROPICAL_STORM: f64 = 34.0;
    pub const CATEGORY_1: f64 = 64.0;
    pub const CATEGORY_2: f64 = 83.0;
    pub const CATEGORY_3: f64 = 96.0;
    pub const CATEGORY_4: f64 = 113.0;
    pub const CATEGORY_5: f64 = 137.0;
}

// =============================================================================
// Climate Phase
// =============================================================================

/// Running-mean anomaly magnitude marking a warm or cold month
pub const PHASE_THRESHOLD: f64 = 0.5;

/// Consecutive months required for a warm or cold episode
pub const PHASE_MIN_DURATION: usize = 5;

// =============================================================================
// Geometry
// =============================================================================

/// Longitude jump (degrees) taken as an antimeridian crossing
pub const ANTIMERIDIAN_JUMP_DEGREES: f64 = 270.0;

/// Segments shorter than this (degrees) get their end nudged
pub const DEFAULT_DEGENERATE_THRESHOLD: f64 = 0.14;

/// Nudge applied to each axis of a degenerate segment end
pub const DEFAULT_DEGENERATE_OFFSET: f64 = 0.001;

/// Offset of the synthetic end point of a storm's last segment
pub const DEFAULT_FINAL_SEGMENT_OFFSET: f64 = 0.0001;

/// Sphere radius of the web Mercator projection (metres)
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Largest absolute latitude accepted for projection
pub const MAX_PROJECTABLE_LATITUDE: f64 = 89.9;

// =============================================================================
// Deduplication
// =============================================================================

/// Number of recently accepted storms compared in name-based matching
pub const DEFAULT_DEDUP_WINDOW: usize = 5;

// =============================================================================
// File Patterns and Output
// =============================================================================

/// Default input file patterns searched inside the data directory
pub mod file_patterns {
    pub const HURDAT_ATLANTIC: &str = "hurdat2-1851-*.txt";
    pub const HURDAT_PACIFIC: &str = "hurdat2-nepac-*.txt";
    pub const IBTRACS: &str = "ibtracs*.csv";
    pub const ENSO: &str = "detrend.nino34*.txt";
    pub const CROSSWALK: &str = "*[Mm]apping*.txt";
    pub const REPORTS: &str = "*[Rr]eports*.txt";
}

/// Data directory name below the platform data dir
pub const DATA_DIR_NAME: &str = "cyclone-tracks";

pub const TRACKS_OUTPUT_FILENAME: &str = "tracks.parquet";
pub const SEGMENTS_OUTPUT_FILENAME: &str = "segments.parquet";

// =============================================================================
// Date Formats
// =============================================================================

pub const IBTRACS_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const FALLBACK_DATETIME_FORMAT: &str = "%m/%d/%Y %H:%M";
pub const HURDAT_DATETIME_FORMAT: &str = "%Y%m%d %H%M";
pub const PHASE_KEY_FORMAT: &str = "%Y-%m";
pub const OBSERVATION_DATE_FORMAT: &str = "%Y%m%d";
pub const DISPLAY_DATE_FORMAT: &str = "%b %d, %Y";

/// Check whether a storm name is a placeholder rather than a real name
pub fn is_generic_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty()
        || GENERIC_NAME_MARKERS
            .iter()
            .any(|marker| trimmed.to_uppercase().contains(marker))
}

/// Check whether an HHMM time is one of the filtered off-synoptic hours
pub fn is_off_synoptic(hhmm: u32) -> bool {
    OFF_SYNOPTIC_TIMES.contains(&hhmm)
}
