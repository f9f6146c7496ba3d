//! Ship track time series.
//!
//! A [`Track`] is always sorted by time with unique timestamps, and every point
//! carries its offset in seconds from the first point. That offset is the
//! abscissa the position interpolants are fitted on.

pub mod interpolator;
pub mod reader;

pub use interpolator::TrackInterpolator;
pub use reader::{read_track, read_track_table};

use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::math::GeoExtent;
use crate::time::elapsed_seconds;

const LOG_TARGET: &str = "oceanet.track";

#[derive(thiserror::Error, Debug)]
pub enum TrackError {
    #[error("unable to read track file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed track table: {0}")]
    Csv(#[from] csv::Error),
    #[error("unsupported track file extension '{0}' (expected .tab or .txt)")]
    UnsupportedExtension(String),
    #[error("no end of header ('*/') within the first {0} lines")]
    MissingHeaderEnd(usize),
    #[error("track table has no column named like '{0}'")]
    MissingColumn(&'static str),
    #[error("unparsable timestamp '{value}' in data row {row}")]
    Timestamp { row: usize, value: String },
    #[error("track contains no usable points")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub elapsed_seconds: f64,
}

impl TrackPoint {
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            elapsed_seconds: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    /// Orders the points by time, drops repeated timestamps and derives the
    /// elapsed-seconds axis.
    pub fn from_points(mut points: Vec<TrackPoint>) -> Result<Self, TrackError> {
        if points.is_empty() {
            return Err(TrackError::Empty);
        }
        points.sort_by_key(|p| p.timestamp);

        let before = points.len();
        points.dedup_by_key(|p| p.timestamp);
        let duplicates = before - points.len();
        if duplicates > 0 {
            warn!(
                target: LOG_TARGET,
                "{} track points share a timestamp with an earlier point and were dropped", duplicates
            );
        }

        let origin = points[0].timestamp;
        for point in &mut points {
            point.elapsed_seconds = elapsed_seconds(origin, point.timestamp);
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> DateTime<Utc> {
        self.points[0].timestamp
    }

    pub fn last(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].timestamp
    }

    /// Offset of `instant` from the first track point.
    pub fn elapsed_of(&self, instant: DateTime<Utc>) -> f64 {
        elapsed_seconds(self.first(), instant)
    }

    /// Whether `instant` lies in the closed interval covered by the track.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.first() && instant <= self.last()
    }

    pub fn elapsed(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.elapsed_seconds).collect()
    }

    pub fn latitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.latitude).collect()
    }

    pub fn longitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.longitude).collect()
    }

    pub fn extent(&self) -> Option<GeoExtent> {
        GeoExtent::from_positions(self.points.iter().map(|p| (p.latitude, p.longitude)))
    }
}
