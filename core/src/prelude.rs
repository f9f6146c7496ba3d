use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::track::Track;

/// A timestamped image or sensor record travelling through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Short identifier written to publication files (`<dir>/<basename>`).
    pub file: String,
    pub full_path: PathBuf,
    pub timestamp: DateTime<Utc>,
    /// Offset from the first track timestamp, filled by [`assign_elapsed`](crate::processing::assign_elapsed).
    pub elapsed_seconds: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Record {
    pub fn new(file: impl Into<String>, full_path: impl Into<PathBuf>, timestamp: DateTime<Utc>) -> Self {
        Self {
            file: file.into(),
            full_path: full_path.into(),
            timestamp,
            elapsed_seconds: 0.0,
            latitude: None,
            longitude: None,
        }
    }

    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

/// Input payload for a processing stage.
#[derive(Debug, Clone, Default)]
pub struct StageInput {
    pub records: Vec<Record>,
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub records: Vec<Record>,
    pub metadata: StageMetadata,
}

/// Bookkeeping used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub removed: usize,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum StageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("record {file} at {elapsed} s lies outside the track window [{min}, {max}]")]
    OutOfRange {
        file: String,
        elapsed: f64,
        min: f64,
        max: f64,
    },
    #[error("interpolation failed: {0}")]
    Interpolation(String),
    #[error("stage not initialized")]
    NotInitialized,
}

pub type StageResult<T> = Result<T, StageError>;

/// A step of the record pipeline, bound to one ship track.
pub trait ProcessingStage {
    fn initialize(&mut self, track: &Track) -> StageResult<()>;
    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput>;
    fn cleanup(&mut self);
}
