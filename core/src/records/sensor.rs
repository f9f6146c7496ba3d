//! Readings of the ship's weather and radiation station (SCAW).
//!
//! The logger writes headerless, comma separated lines. Values may be quoted and
//! missing values are written as `NAN`. Only the columns below are used.

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::math::GeoExtent;
use crate::time::parse_utc_timestamp;

const LOG_TARGET: &str = "oceanet.sensor";

pub const TIMESTAMP_COLUMN: usize = 0;
pub const LATITUDE_COLUMN: usize = 5;
pub const LONGITUDE_COLUMN: usize = 6;
pub const DSR_COLUMN: usize = 19;
pub const DLR_COLUMN: usize = 20;

const MISSING: &str = "NAN";

#[derive(thiserror::Error, Debug)]
pub enum SensorError {
    #[error("unable to read sensor file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed sensor line: {0}")]
    Csv(#[from] csv::Error),
    #[error("unparsable timestamp '{value}' in line {line}")]
    Timestamp { line: usize, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Downward shortwave radiation.
    pub dsr: f64,
    /// Downward longwave radiation.
    pub dlr: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorBatch {
    readings: Vec<SensorReading>,
}

impl SensorBatch {
    pub fn new(mut readings: Vec<SensorReading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        Self { readings }
    }

    pub fn readings(&self) -> &[SensorReading] {
        &self.readings
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Appends another batch and restores time order.
    pub fn merge(&mut self, other: SensorBatch) {
        self.readings.extend(other.readings);
        self.readings.sort_by_key(|r| r.timestamp);
    }

    /// Timestamps that repeat an earlier reading's timestamp.
    pub fn duplicate_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.readings
            .windows(2)
            .filter(|w| w[0].timestamp == w[1].timestamp)
            .map(|w| w[1].timestamp)
            .collect()
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicate_timestamps().len()
    }

    /// Removes readings with a repeated timestamp, keeping the first occurrence.
    pub fn drop_duplicates(&mut self) -> usize {
        let before = self.readings.len();
        self.readings.dedup_by_key(|r| r.timestamp);
        before - self.readings.len()
    }

    pub fn is_monotonic(&self) -> bool {
        self.readings.windows(2).all(|w| w[0].timestamp <= w[1].timestamp)
    }

    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.readings.first()?.timestamp, self.readings.last()?.timestamp))
    }

    pub fn extent(&self) -> Option<GeoExtent> {
        GeoExtent::from_positions(self.readings.iter().map(|r| (r.latitude, r.longitude)))
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.readings.iter().map(|r| r.timestamp).collect()
    }

    pub fn column(&self, select: impl Fn(&SensorReading) -> f64) -> Vec<f64> {
        self.readings.iter().map(select).collect()
    }
}

fn value(record: &csv::StringRecord, idx: usize) -> Option<f64> {
    record
        .get(idx)
        .filter(|v| !v.eq_ignore_ascii_case(MISSING))
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Parses one SCAW logger file. Lines with a missing mapped value are dropped.
pub fn parse_scaw<R: Read>(mut reader: R) -> Result<SensorBatch, SensorError> {
    let mut content = String::new();
    reader.read_to_string(&mut content)?;
    let content = content.replace('"', "");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut readings = Vec::new();
    let mut dropped = 0usize;
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let raw_time = record.get(TIMESTAMP_COLUMN).unwrap_or_default();
        if raw_time.is_empty() || raw_time.eq_ignore_ascii_case(MISSING) {
            dropped += 1;
            continue;
        }
        let timestamp = parse_utc_timestamp(raw_time).ok_or_else(|| SensorError::Timestamp {
            line: line + 1,
            value: raw_time.to_string(),
        })?;

        match (
            value(&record, LATITUDE_COLUMN),
            value(&record, LONGITUDE_COLUMN),
            value(&record, DSR_COLUMN),
            value(&record, DLR_COLUMN),
        ) {
            (Some(latitude), Some(longitude), Some(dsr), Some(dlr)) => {
                readings.push(SensorReading {
                    timestamp,
                    latitude,
                    longitude,
                    dsr,
                    dlr,
                })
            }
            _ => dropped += 1,
        }
    }

    if dropped > 0 {
        info!(
            target: LOG_TARGET,
            "{} lines with missing latitude/longitude/DSR/DLR values were dropped", dropped
        );
    }

    let batch = SensorBatch::new(readings);
    let duplicates = batch.duplicate_timestamps();
    if !duplicates.is_empty() {
        warn!(
            target: LOG_TARGET,
            "{} / {} duplicates in rows of DateTime exist",
            duplicates.len(),
            batch.len()
        );
        debug!(target: LOG_TARGET, "Duplicates are: {:?}", duplicates);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn line(ts: &str, lat: &str, lon: &str, dsr: &str, dlr: &str) -> String {
        let mut cols = vec!["0".to_string(); 21];
        cols[TIMESTAMP_COLUMN] = format!("\"{}\"", ts);
        cols[LATITUDE_COLUMN] = lat.to_string();
        cols[LONGITUDE_COLUMN] = lon.to_string();
        cols[DSR_COLUMN] = dsr.to_string();
        cols[DLR_COLUMN] = dlr.to_string();
        cols.join(",")
    }

    #[test]
    fn parses_and_sorts_readings() {
        let text = [
            line("2019-10-01 00:01:00", "85.1", "120.5", "12.0", "230.1"),
            line("2019-10-01 00:00:00", "85.0", "120.4", "11.0", "229.8"),
        ]
        .join("\n");
        let batch = parse_scaw(text.as_bytes()).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(
            batch.readings()[0].timestamp,
            Utc.with_ymd_and_hms(2019, 10, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(batch.column(|r| r.dsr), vec![11.0, 12.0]);
        assert!(batch.is_monotonic());
    }

    #[test]
    fn drops_lines_with_missing_values() {
        let text = [
            line("2019-10-01 00:00:00", "85.0", "120.4", "NAN", "229.8"),
            line("2019-10-01 00:01:00", "85.1", "", "12.0", "230.1"),
            line("2019-10-01 00:02:00", "85.2", "120.6", "13.0", "230.4"),
            "\"2019-10-01 00:03:00\",1,2".to_string(),
        ]
        .join("\n");
        let batch = parse_scaw(text.as_bytes()).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.readings()[0].latitude, 85.2);
    }

    #[test]
    fn counts_and_drops_duplicates() {
        let text = [
            line("2019-10-01 00:00:00", "85.0", "120.4", "11.0", "229.8"),
            line("2019-10-01 00:00:00", "85.0", "120.4", "99.0", "229.8"),
            line("2019-10-01 00:01:00", "85.1", "120.5", "12.0", "230.1"),
        ]
        .join("\n");
        let mut batch = parse_scaw(text.as_bytes()).unwrap();
        assert_eq!(batch.duplicate_count(), 1);
        assert_eq!(batch.drop_duplicates(), 1);
        assert_eq!(batch.column(|r| r.dsr), vec![11.0, 12.0]);
        assert_eq!(batch.duplicate_count(), 0);
    }

    #[test]
    fn merge_restores_order() {
        let first = parse_scaw(line("2019-10-02 00:00:00", "85", "120", "1", "2").as_bytes()).unwrap();
        let mut batch = parse_scaw(line("2019-10-01 00:00:00", "84", "119", "1", "2").as_bytes()).unwrap();
        batch.merge(first);
        let (start, end) = batch.time_range().unwrap();
        assert!(start < end);
        assert_eq!(batch.extent().unwrap().lat_max, 85.0);
    }

    #[test]
    fn unparsable_timestamp_is_an_error() {
        let text = line("not a date", "85.0", "120.4", "11.0", "229.8");
        assert!(matches!(
            parse_scaw(text.as_bytes()),
            Err(SensorError::Timestamp { line: 1, .. })
        ));
    }
}
