use log::info;

use super::{Track, LOG_TARGET};
use crate::math::{CubicSpline, SplineError};

/// Cubic interpolants for latitude and longitude over elapsed track seconds.
#[derive(Debug, Clone)]
pub struct TrackInterpolator {
    latitude: CubicSpline,
    longitude: CubicSpline,
}

impl TrackInterpolator {
    pub fn fit(track: &Track) -> Result<Self, SplineError> {
        info!(
            target: LOG_TARGET,
            "Compute interpolation parameters for latitude/longitude over {} points",
            track.len()
        );
        let elapsed = track.elapsed();
        Ok(Self {
            latitude: CubicSpline::new(&elapsed, &track.latitudes())?,
            longitude: CubicSpline::new(&elapsed, &track.longitudes())?,
        })
    }

    /// Latitude and longitude at `elapsed` seconds after the first track point.
    pub fn position(&self, elapsed: f64) -> Result<(f64, f64), SplineError> {
        Ok((
            self.latitude.evaluate(elapsed)?,
            self.longitude.evaluate(elapsed)?,
        ))
    }
}
