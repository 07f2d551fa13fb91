//! Shared source text fixtures

use crate::constants::ibtracs_columns as columns;

/// Katrina with four fixes and a single-fix unnamed depression
pub const ATLANTIC: &str = "\
AL122005,            KATRINA,      4,
20050823, 1800,  , TD, 23.1N,  75.1W,  30, 1008,
20050824, 0000,  , TD, 23.4N,  75.7W,  30, 1007,
20050824, 0600,  , TS, 23.8N,  76.2W,  35, 1007,
20050825, 1800,  , HU, 26.0N,  79.0W,  70,  984,
AL992005,            UNNAMED,      1,
20050901, 0000,  , TD, 20.0N,  60.0W,  25, 1010,
";

/// A hurricane drifting west across the antimeridian
pub const PACIFIC_CROSSING: &str = "\
EP172015,               IGOR,      2,
20150901, 0000,  , HU, 20.0N, 178.0W, 100,  950,
20150901, 0600,  , HU, 20.5N, 179.5E,  95,  955,
";

const WIDTH: usize = 163;

/// One IBTrACS data row with USA agency wind and pressure
#[allow(clippy::too_many_arguments)]
pub fn ibtracs_row(
    sid: &str,
    basin: &str,
    name: &str,
    time: &str,
    lat: &str,
    lon: &str,
    wind: &str,
    track_type: &str,
) -> String {
    let mut fields = vec![" ".to_string(); WIDTH];
    fields[columns::SID] = sid.to_string();
    fields[columns::SEASON] = time[..4].to_string();
    fields[columns::BASIN] = basin.to_string();
    fields[columns::NAME] = name.to_string();
    fields[columns::ISO_TIME] = time.to_string();
    fields[columns::NATURE] = "TS".to_string();
    fields[columns::LAT] = lat.to_string();
    fields[columns::LON] = lon.to_string();
    fields[columns::TRACK_TYPE] = track_type.to_string();
    fields[23] = wind.to_string();
    fields[24] = "990".to_string();
    fields.join(",")
}

/// IBTrACS text with both header rows
pub fn ibtracs(rows: &[String]) -> String {
    let mut text = String::from("SID,SEASON,NUMBER,BASIN,SUBBASIN,NAME,ISO_TIME\n ,Year, , , , , \n");
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    text
}

/// IBTrACS copy of Katrina, including one off-synoptic fix
pub fn ibtracs_katrina() -> String {
    ibtracs(&[
        ibtracs_row("2005236N23285", "NA", "KATRINA", "2005-08-23 18:00:00", "23.1", "-75.1", "30", "main"),
        ibtracs_row("2005236N23285", "NA", "KATRINA", "2005-08-23 21:00:00", "23.2", "-75.4", "30", "main"),
        ibtracs_row("2005236N23285", "NA", "KATRINA", "2005-08-24 00:00:00", "23.4", "-75.7", "30", "main"),
        ibtracs_row("2005236N23285", "NA", "KATRINA", "2005-08-24 06:00:00", "23.8", "-76.2", "35", "main"),
    ])
}

/// Crosswalk linking the HURDAT2 id of Katrina to its IBTrACS id
pub const CROSSWALK: &str = "\
2005236N23285 AL122005 hurdat_atl
";
