use log::{info, warn};
use std::fs;
use std::io::Read;
use std::path::Path;

use super::{Track, TrackError, TrackPoint, LOG_TARGET};
use crate::time::parse_utc_timestamp;

/// Lines searched for the closing `*/` of a PANGAEA header block.
pub const HEADER_SEARCH_LIMIT: usize = 100;

const HEADER_END: &str = "*/";
const TIMESTAMP_COLUMN: &str = "Date/Time";
const LATITUDE_COLUMN: &str = "Latitude";
const LONGITUDE_COLUMN: &str = "Longitude";

/// Loads a ship track from a PANGAEA `.tab` export or a plain tab-separated `.txt`.
pub fn read_track<P: AsRef<Path>>(path: P) -> Result<Track, TrackError> {
    let path = path.as_ref();
    info!(target: LOG_TARGET, "Read ship track: {}", path.display());

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    let contents = fs::read_to_string(path)?;

    let table = match extension {
        "tab" => {
            let offset = header_end_offset(&contents)?;
            info!(target: LOG_TARGET, "End of file header detected: {}", path.display());
            &contents[offset..]
        }
        "txt" => contents.as_str(),
        other => return Err(TrackError::UnsupportedExtension(other.to_string())),
    };

    let track = read_track_table(table.as_bytes())?;
    info!(
        target: LOG_TARGET,
        "Track covers {} .. {} with {} points",
        track.first(),
        track.last(),
        track.len()
    );
    Ok(track)
}

/// Byte offset of the first line after the header terminator.
fn header_end_offset(contents: &str) -> Result<usize, TrackError> {
    let mut offset = 0;
    for line in contents.split_inclusive('\n').take(HEADER_SEARCH_LIMIT) {
        offset += line.len();
        if line.contains(HEADER_END) {
            return Ok(offset);
        }
    }
    Err(TrackError::MissingHeaderEnd(HEADER_SEARCH_LIMIT))
}

/// Parses a tab-separated table whose first row names the columns.
pub fn read_track_table<R: Read>(reader: R) -> Result<Track, TrackError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let time_idx = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| name.contains(TIMESTAMP_COLUMN))
        .map(|(idx, _)| idx)
        .last()
        .ok_or(TrackError::MissingColumn(TIMESTAMP_COLUMN))?;
    let lat_idx = headers
        .iter()
        .position(|name| name.starts_with(LATITUDE_COLUMN))
        .ok_or(TrackError::MissingColumn(LATITUDE_COLUMN))?;
    let lon_idx = headers
        .iter()
        .position(|name| name.starts_with(LONGITUDE_COLUMN))
        .ok_or(TrackError::MissingColumn(LONGITUDE_COLUMN))?;

    let mut points = Vec::new();
    let mut skipped = 0usize;
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_time = record.get(time_idx).unwrap_or_default();
        if raw_time.is_empty() && record.iter().all(str::is_empty) {
            continue;
        }
        let timestamp = parse_utc_timestamp(raw_time).ok_or_else(|| TrackError::Timestamp {
            row: row + 1,
            value: raw_time.to_string(),
        })?;

        let coordinate = |idx: usize| {
            record
                .get(idx)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };
        match (coordinate(lat_idx), coordinate(lon_idx)) {
            (Some(latitude), Some(longitude)) => {
                points.push(TrackPoint::new(timestamp, latitude, longitude))
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(
            target: LOG_TARGET,
            "{} track rows without a valid latitude/longitude were skipped", skipped
        );
    }
    Track::from_points(points)
}
