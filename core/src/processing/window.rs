use chrono::{DateTime, Utc};

use crate::prelude::{
    ProcessingStage, StageError, StageInput, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;
use crate::track::Track;

/// Drops records whose timestamp lies outside the closed track interval.
pub struct WindowStage {
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    logger: LogManager,
}

impl WindowStage {
    pub fn new() -> Self {
        Self {
            window: None,
            logger: LogManager::new("oceanet.window"),
        }
    }
}

impl Default for WindowStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for WindowStage {
    fn initialize(&mut self, track: &Track) -> StageResult<()> {
        if track.is_empty() {
            return Err(StageError::InvalidInput("track has no points".into()));
        }
        self.window = Some((track.first(), track.last()));
        Ok(())
    }

    fn execute(&mut self, input: StageInput) -> StageResult<StageOutput> {
        let (start, end) = self.window.ok_or(StageError::NotInitialized)?;
        self.logger.record("Remove records outside the track period");

        let mut records = input.records;
        let collected = records.len();

        records.retain(|r| r.timestamp >= start);
        let before_start = collected - records.len();
        self.logger.record(&format!(
            "{} records removed (before first track timestamp {})",
            before_start, start
        ));

        let remaining = records.len();
        records.retain(|r| r.timestamp <= end);
        let after_end = remaining - records.len();
        self.logger.record(&format!(
            "{} records removed (after last track timestamp {})",
            after_end, end
        ));

        self.logger
            .record(&format!("Number of originally collected records: {}", collected));
        self.logger
            .record(&format!("Number of remaining records: {}", records.len()));

        Ok(StageOutput {
            records,
            metadata: StageMetadata {
                removed: before_start + after_end,
                notes: vec![
                    format!("{} before track start", before_start),
                    format!("{} after track end", after_end),
                ],
            },
        })
    }

    fn cleanup(&mut self) {
        self.window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::Record;
    use crate::track::TrackPoint;
    use chrono::TimeZone;

    fn at(min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 10, 29, 12, min, 0).unwrap()
    }

    fn track() -> Track {
        Track::from_points(vec![
            TrackPoint::new(at(10), 54.0, 8.0),
            TrackPoint::new(at(20), 54.1, 8.1),
            TrackPoint::new(at(30), 54.2, 8.2),
        ])
        .unwrap()
    }

    #[test]
    fn keeps_records_on_the_boundaries() {
        let mut stage = WindowStage::new();
        stage.initialize(&track()).unwrap();

        let records = [5, 10, 15, 30, 31, 45]
            .iter()
            .map(|&m| Record::new(format!("d/{}.JPG", m), format!("/x/d/{}.JPG", m), at(m)))
            .collect();
        let output = stage.execute(StageInput { records }).unwrap();

        let kept: Vec<_> = output.records.iter().map(|r| r.timestamp).collect();
        assert_eq!(kept, vec![at(10), at(15), at(30)]);
        assert_eq!(output.metadata.removed, 3);
        assert_eq!(output.metadata.notes[0], "1 before track start");
        assert_eq!(output.metadata.notes[1], "2 after track end");
        stage.cleanup();
    }

    #[test]
    fn requires_initialization() {
        let mut stage = WindowStage::new();
        assert_eq!(
            stage.execute(StageInput::default()).unwrap_err(),
            StageError::NotInitialized
        );
    }
}
