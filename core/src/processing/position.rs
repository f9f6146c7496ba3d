use crate::math::SplineError;
use crate::prelude::{
    ProcessingStage, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;
use crate::track::{Track, TrackInterpolator};

/// Assigns interpolated track positions to records already inside the track window.
pub struct PositionStage {
    interpolator: Option<TrackInterpolator>,
    track_points: usize,
    logger: LogManager,
}

impl PositionStage {
    pub fn new() -> Self {
        Self {
            interpolator: None,
            track_points: 0,
            logger: LogManager::new("oceanet.position"),
        }
    }
}

impl Default for PositionStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for PositionStage {
    fn initialize(&mut self, track: &Track) -> StageResult<()> {
        let interpolator = TrackInterpolator::fit(track)
            .map_err(|err| StageError::Interpolation(err.to_string()))?;
        self.interpolator = Some(interpolator);
        self.track_points = track.len();
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let interpolator = self
            .interpolator
            .as_ref()
            .ok_or(StageError::NotInitialized)?;
        self.logger.record("Compute interpolated record positions");

        let mut records = input.records;
        for record in &mut records {
            let (latitude, longitude) = interpolator
                .position(record.elapsed_seconds)
                .map_err(|err| match err {
                    SplineError::OutOfRange { value, min, max } => StageError::OutOfRange {
                        file: record.file.clone(),
                        elapsed: value,
                        min,
                        max,
                    },
                    other => StageError::Interpolation(other.to_string()),
                })?;

            if !latitude.is_finite() || !longitude.is_finite() {
                self.logger.warn(&format!(
                    "Track with {} points may be too dense for interpolation, consider a coarser track",
                    self.track_points
                ));
                return Err(StageError::Interpolation(format!(
                    "non-finite position for {}",
                    record.file
                )));
            }
            record.latitude = Some(latitude);
            record.longitude = Some(longitude);
        }

        Ok(StageOutput {
            metadata: StageMetadata {
                removed: 0,
                notes: vec![format!("{} positions assigned", records.len())],
            },
            records,
        })
    }

    fn cleanup(&mut self) {
        self.interpolator = None;
        self.track_points = 0;
    }
}
