pub mod position;
pub mod window;

pub use position::PositionStage;
pub use window::WindowStage;

use crate::prelude::Record;
use crate::track::Track;

/// Sets each record's offset from the first track timestamp and orders the
/// records by it.
pub fn assign_elapsed(records: &mut [Record], track: &Track) {
    for record in records.iter_mut() {
        record.elapsed_seconds = track.elapsed_of(record.timestamp);
    }
    records.sort_by(|a, b| a.elapsed_seconds.total_cmp(&b.elapsed_seconds));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::track::TrackPoint;
    use chrono::{TimeZone, Utc};

    #[test]
    fn offsets_are_relative_to_the_earliest_track_point() {
        let t0 = Utc.with_ymd_and_hms(2020, 3, 1, 6, 0, 0).unwrap();
        let track = Track::from_points(vec![
            TrackPoint::new(t0 + chrono::Duration::hours(1), 1.0, 1.0),
            TrackPoint::new(t0, 0.0, 0.0),
        ])
        .unwrap();

        let mut records = vec![
            Record::new("late", "/late", t0 + chrono::Duration::minutes(30)),
            Record::new("early", "/early", t0 - chrono::Duration::minutes(5)),
        ];
        assign_elapsed(&mut records, &track);
        assert_eq!(records[0].file, "early");
        assert_eq!(records[0].elapsed_seconds, -300.0);
        assert_eq!(records[1].elapsed_seconds, 1800.0);
    }
}
