use serde::{Deserialize, Serialize};

pub struct StatsHelper;

impl StatsHelper {
    /// Minimum and maximum of the finite values, `None` when there are none.
    pub fn min_max<I>(values: I) -> Option<(f64, f64)>
    where
        I: IntoIterator<Item = f64>,
    {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

/// Latitude/longitude bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoExtent {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoExtent {
    pub fn from_positions<I>(positions: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let (lats, lons): (Vec<f64>, Vec<f64>) = positions.into_iter().unzip();
        let (lat_min, lat_max) = StatsHelper::min_max(lats)?;
        let (lon_min, lon_max) = StatsHelper::min_max(lons)?;
        Some(Self {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        })
    }

    pub fn center(&self) -> (f64, f64) {
        (
            self.lat_min + (self.lat_max - self.lat_min) * 0.5,
            self.lon_min + (self.lon_max - self.lon_min) * 0.5,
        )
    }

    /// Grows the box by a fixed margin plus `span_factor` times its own span,
    /// clamped to the valid coordinate range.
    pub fn padded(&self, lat_margin: f64, lon_margin: f64, span_factor: f64) -> Self {
        let lat_span = (self.lat_max - self.lat_min).abs();
        let lon_span = (self.lon_max - self.lon_min).abs();
        Self {
            lat_min: (self.lat_min - lat_margin - span_factor * lat_span).max(-90.0),
            lat_max: (self.lat_max + lat_margin + span_factor * lat_span).min(90.0),
            lon_min: (self.lon_min - lon_margin - span_factor * lon_span).max(-180.0),
            lon_max: (self.lon_max + lon_margin + span_factor * lon_span).min(180.0),
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }
}
