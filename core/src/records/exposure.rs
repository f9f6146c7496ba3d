//! Exposure time of camera images.
//!
//! Image EXIF clocks are not trusted. The acquisition software writes one
//! directory per day named `YYYY-MM-DD` (UTC) and, for most cameras, file names
//! starting with `HHMMSS_nnnn`. Files without such a name fall back to their
//! modification time, which must then agree with the directory date.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use crate::prelude::Record;

const DIRECTORY_DATE_FORMAT: &str = "%Y-%m-%d";

fn filename_time_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{6})_\d{4}").expect("static regex"))
}

#[derive(thiserror::Error, Debug)]
pub enum ExposureError {
    #[error("directory name '{value}' of {path} is not a YYYY-MM-DD date")]
    DirectoryDate { path: PathBuf, value: String },
    #[error("file name time '{value}' of {path} is not a valid HHMMSS")]
    FilenameTime { path: PathBuf, value: String },
    #[error("unable to read modification time of {path}: {source}")]
    Mtime { path: PathBuf, source: io::Error },
    #[error(
        "file mtime {timestamp} of {path} lies outside directory date {directory} ({offset_seconds} seconds from its midnight)"
    )]
    Implausible {
        path: PathBuf,
        directory: NaiveDate,
        timestamp: DateTime<Utc>,
        offset_seconds: i64,
    },
}

/// Where an exposure time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposureSource {
    FileName,
    ModificationTime,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Exposure {
    pub directory: String,
    pub basename: String,
    pub timestamp: DateTime<Utc>,
    pub source: ExposureSource,
}

impl Exposure {
    /// Identifier used in publication tables and archives.
    pub fn file(&self) -> String {
        format!("{}/{}", self.directory, self.basename)
    }

    pub fn into_record(self, full_path: PathBuf) -> Record {
        Record::new(self.file(), full_path, self.timestamp)
    }
}

/// Acceptance window of modification times around the directory day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureRule {
    /// Slack on both sides of the directory day `[00:00, 24:00)` UTC. Images
    /// are written shortly after exposure, so late shots of a day carry an
    /// mtime just past midnight.
    pub lag_tolerance: Duration,
}

impl Default for ExposureRule {
    fn default() -> Self {
        Self {
            lag_tolerance: Duration::hours(1),
        }
    }
}

impl ExposureRule {
    pub fn derive(&self, path: &Path) -> Result<Exposure, ExposureError> {
        self.derive_with(path, || fs::metadata(path)?.modified())
    }

    /// Same as [`derive`](Self::derive) with the modification time supplied by the
    /// caller. `mtime` is only consulted when the file name carries no time.
    pub fn derive_with<F>(&self, path: &Path, mtime: F) -> Result<Exposure, ExposureError>
    where
        F: FnOnce() -> io::Result<SystemTime>,
    {
        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let directory = path
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let date = NaiveDate::parse_from_str(&directory, DIRECTORY_DATE_FORMAT).map_err(|_| {
            ExposureError::DirectoryDate {
                path: path.to_path_buf(),
                value: directory.clone(),
            }
        })?;

        if let Some(captures) = filename_time_pattern().captures(&basename) {
            let raw = &captures[1];
            let time = NaiveTime::parse_from_str(raw, "%H%M%S").map_err(|_| {
                ExposureError::FilenameTime {
                    path: path.to_path_buf(),
                    value: raw.to_string(),
                }
            })?;
            return Ok(Exposure {
                directory,
                basename,
                timestamp: Utc.from_utc_datetime(&date.and_time(time)),
                source: ExposureSource::FileName,
            });
        }

        // The file system stores an absolute instant, whatever zone the
        // acquisition host displayed it in.
        let modified = mtime().map_err(|source| ExposureError::Mtime {
            path: path.to_path_buf(),
            source,
        })?;
        let timestamp = DateTime::<Utc>::from(modified);

        let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::default()));
        if !self.is_plausible(midnight, timestamp) {
            return Err(ExposureError::Implausible {
                path: path.to_path_buf(),
                directory: date,
                timestamp,
                offset_seconds: (timestamp - midnight).num_seconds(),
            });
        }

        Ok(Exposure {
            directory,
            basename,
            timestamp,
            source: ExposureSource::ModificationTime,
        })
    }

    fn is_plausible(&self, midnight: DateTime<Utc>, timestamp: DateTime<Utc>) -> bool {
        let earliest = midnight - self.lag_tolerance;
        let latest = midnight + Duration::days(1) + self.lag_tolerance;
        (earliest..=latest).contains(&timestamp)
    }
}
