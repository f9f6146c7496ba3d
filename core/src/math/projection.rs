//! Map projections used by the track plots.
//!
//! Coordinates come in as degrees, projected coordinates are on the unit sphere for
//! the orthographic view and plain degrees for the equirectangular one.

use super::stats::GeoExtent;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orthographic {
    lat0: f64,
    lon0: f64,
    sin_lat0: f64,
    cos_lat0: f64,
}

impl Orthographic {
    pub fn centered(lat_deg: f64, lon_deg: f64) -> Self {
        let lat0 = lat_deg.to_radians();
        Self {
            lat0,
            lon0: lon_deg.to_radians(),
            sin_lat0: lat0.sin(),
            cos_lat0: lat0.cos(),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.lat0.to_degrees(), self.lon0.to_degrees())
    }

    /// Projects a point, `None` when it lies on the far hemisphere.
    pub fn project(&self, lat_deg: f64, lon_deg: f64) -> Option<(f64, f64)> {
        let lat = lat_deg.to_radians();
        let dlon = lon_deg.to_radians() - self.lon0;
        let cos_c = self.sin_lat0 * lat.sin() + self.cos_lat0 * lat.cos() * dlon.cos();
        if cos_c < 0.0 {
            return None;
        }
        let x = lat.cos() * dlon.sin();
        let y = self.cos_lat0 * lat.sin() - self.sin_lat0 * lat.cos() * dlon.cos();
        Some((x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapProjection {
    /// Whole visible hemisphere around a center point.
    Orthographic(Orthographic),
    /// Regional lon/lat box.
    PlateCarree(GeoExtent),
}

impl MapProjection {
    pub fn project(&self, lat: f64, lon: f64) -> Option<(f64, f64)> {
        match self {
            MapProjection::Orthographic(ortho) => ortho.project(lat, lon),
            MapProjection::PlateCarree(extent) => {
                extent.contains(lat, lon).then_some((lon, lat))
            }
        }
    }

    /// Projected x and y ranges of the drawing area.
    pub fn bounds(&self) -> ((f64, f64), (f64, f64)) {
        match self {
            MapProjection::Orthographic(_) => ((-1.0, 1.0), (-1.0, 1.0)),
            MapProjection::PlateCarree(extent) => (
                (extent.lon_min, extent.lon_max),
                (extent.lat_min, extent.lat_max),
            ),
        }
    }

    /// Projects a polyline and splits it where it leaves the visible area.
    pub fn project_path(&self, path: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for &(lat, lon) in path {
            match self.project(lat, lon) {
                Some(point) => current.push(point),
                None => {
                    if current.len() > 1 {
                        segments.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                }
            }
        }
        if current.len() > 1 {
            segments.push(current);
        }
        segments
    }
}

/// Parallels and meridians every `step` degrees, each sampled every degree.
pub fn graticule(step: f64) -> Vec<Vec<(f64, f64)>> {
    let step = step.max(1.0);
    let mut lines = Vec::new();

    let mut lat = -90.0 + step;
    while lat < 90.0 {
        lines.push((-180..=180).map(|lon| (lat, lon as f64)).collect());
        lat += step;
    }

    let mut lon = -180.0;
    while lon < 180.0 {
        lines.push((-90..=90).map(|lat| (lat as f64, lon)).collect());
        lon += step;
    }
    lines
}
