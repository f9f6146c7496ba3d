use anyhow::Context;
use chrono::{DateTime, Utc};
use log::info;
use oceanetcore::math::projection::graticule;
use oceanetcore::math::{MapProjection, Orthographic, StatsHelper};
use oceanetcore::records::SensorBatch;
use oceanetcore::time::elapsed_seconds;
use oceanetcore::track::Track;
use oceanetcore::Record;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{ensure_parent_dir, LOG_TARGET};

const MAP_SIZE: (u32, u32) = (1600, 1600);
const SERIES_SIZE: (u32, u32) = (1600, 900);
const GRATICULE_STEP: f64 = 10.0;
const SUBTITLE_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ProjectionKind {
    /// Globe view centered on the track.
    #[default]
    Ortho,
    /// Regional lon/lat box around the track.
    Plate,
}

/// Projected geometry and labels of a cruise map.
#[derive(Debug, Clone)]
pub struct TrackMap {
    pub title: String,
    pub subtitle: String,
    pub projection: MapProjection,
    pub track: Vec<(f64, f64)>,
    pub records: Vec<(f64, f64)>,
    pub graticule: Vec<Vec<(f64, f64)>>,
    pub outline: Vec<(f64, f64)>,
}

impl TrackMap {
    pub fn new(
        cruise: &str,
        track: &Track,
        records: &[Record],
        kind: ProjectionKind,
    ) -> anyhow::Result<Self> {
        let extent = track.extent().context("track has no points to draw")?;
        let projection = match kind {
            ProjectionKind::Ortho => {
                let (lat, lon) = extent.center();
                MapProjection::Orthographic(Orthographic::centered(lat, lon))
            }
            ProjectionKind::Plate => MapProjection::PlateCarree(extent.padded(5.0, 8.0, 0.5)),
        };

        let track_xy = track
            .points()
            .iter()
            .filter_map(|p| projection.project(p.latitude, p.longitude))
            .collect();
        let records_xy = records
            .iter()
            .filter_map(Record::position)
            .filter_map(|(lat, lon)| projection.project(lat, lon))
            .collect();
        let lines = graticule(GRATICULE_STEP)
            .iter()
            .flat_map(|line| projection.project_path(line))
            .collect();
        let outline = match projection {
            MapProjection::Orthographic(_) => (0..=360)
                .map(|deg| {
                    let angle = f64::from(deg).to_radians();
                    (angle.cos(), angle.sin())
                })
                .collect(),
            MapProjection::PlateCarree(_) => Vec::new(),
        };

        Ok(Self {
            title: cruise.to_string(),
            subtitle: record_span(records),
            projection,
            track: track_xy,
            records: records_xy,
            graticule: lines,
            outline,
        })
    }
}

fn record_span(records: &[Record]) -> String {
    let first = records.iter().map(|r| r.timestamp).min();
    let last = records.iter().map(|r| r.timestamp).max();
    match (first, last) {
        (Some(first), Some(last)) => format!(
            "{} - {}",
            first.format(SUBTITLE_FORMAT),
            last.format(SUBTITLE_FORMAT)
        ),
        _ => String::from("no records"),
    }
}

pub fn draw_track_map(path: &Path, map: &TrackMap) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    info!(target: LOG_TARGET, "Plot cruise track to {}", path.display());
    let root = BitMapBackend::new(path, MAP_SIZE).into_drawing_area();
    render_track_map(root, map)
}

fn render_track_map<DB>(root: DrawingArea<DB, Shift>, map: &TrackMap) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    let area = root.titled(&map.title, ("sans-serif", 48))?;
    let ((x_min, x_max), (y_min, y_max)) = map.projection.bounds();

    let mut chart = ChartBuilder::on(&area)
        .caption(&map.subtitle, ("sans-serif", 26))
        .margin(30)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart.draw_series(
        map.graticule
            .iter()
            .map(|line| PathElement::new(line.clone(), BLACK.mix(0.15))),
    )?;
    if !map.outline.is_empty() {
        chart.draw_series(std::iter::once(PathElement::new(map.outline.clone(), BLACK)))?;
    }

    chart
        .draw_series(map.track.iter().map(|&p| Cross::new(p, 3, MAGENTA)))?
        .label("Cruise track")
        .legend(|(x, y)| Cross::new((x, y), 5, MAGENTA));
    chart
        .draw_series(
            map.records
                .iter()
                .map(|&p| EmptyElement::at(p) + PathElement::new(vec![(0, -5), (0, 5)], GREEN)),
        )?
        .label("Record positions")
        .legend(|(x, y)| PathElement::new(vec![(x, y - 6), (x, y + 6)], GREEN));

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK.mix(0.4))
        .position(SeriesLabelPosition::LowerRight)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Hours since the first reading, the x axis of the radiation plot.
fn hours_since(start: DateTime<Utc>, timestamps: &[DateTime<Utc>]) -> Vec<f64> {
    timestamps
        .iter()
        .map(|ts| elapsed_seconds(start, *ts) / 3_600.0)
        .collect()
}

fn padded_range(values: &[f64]) -> (f64, f64) {
    match StatsHelper::min_max(values.iter().copied()) {
        Some((min, max)) if max > min => {
            let pad = (max - min) * 0.05;
            (min - pad, max + pad)
        }
        Some((value, _)) => (value - 1.0, value + 1.0),
        None => (0.0, 1.0),
    }
}

/// Downward shortwave and longwave radiation over time, one panel each.
pub fn draw_radiation_series(path: &Path, title: &str, batch: &SensorBatch) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    info!(target: LOG_TARGET, "Plot radiation time series to {}", path.display());
    let root = BitMapBackend::new(path, SERIES_SIZE).into_drawing_area();
    render_radiation_series(root, title, batch)
}

fn render_radiation_series<DB>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    batch: &SensorBatch,
) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (start, _) = batch.time_range().context("no readings to plot")?;
    let hours = hours_since(start, &batch.timestamps());
    let x_max = hours.last().copied().unwrap_or(0.0).max(1.0 / 60.0);

    root.fill(&WHITE)?;
    let area = root.titled(title, ("sans-serif", 36))?;
    let panels = [
        ("DSR", batch.column(|r| r.dsr), RGBColor(230, 120, 0)),
        ("DLR", batch.column(|r| r.dlr), RGBColor(30, 90, 200)),
    ];

    for (panel, (name, values, color)) in area.split_evenly((2, 1)).iter().zip(panels) {
        let (y_min, y_max) = padded_range(&values);
        let mut chart = ChartBuilder::on(panel)
            .margin(20)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 45)
            .build_cartesian_2d(0.0..x_max, y_min..y_max)?;
        chart
            .configure_mesh()
            .x_desc(format!("hours since {}", start.format(SUBTITLE_FORMAT)))
            .y_desc(format!("{} [W m-2]", name))
            .draw()?;
        chart
            .draw_series(LineSeries::new(
                hours.iter().copied().zip(values.iter().copied()),
                &color,
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], color));
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.7))
            .border_style(BLACK.mix(0.3))
            .draw()?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use oceanetcore::track::TrackPoint;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2019, 10, 1, 0, 0, 0).unwrap()
    }

    fn track() -> Track {
        Track::from_points(
            (0..5)
                .map(|i| TrackPoint::new(t0() + Duration::hours(i), 85.0 + i as f64 * 0.1, 120.0))
                .collect(),
        )
        .unwrap()
    }

    fn record(minutes: i64, lat: f64) -> Record {
        let mut record = Record::new("d/x.JPG", "/d/x.JPG", t0() + Duration::minutes(minutes));
        record.latitude = Some(lat);
        record.longitude = Some(120.0);
        record
    }

    #[test]
    fn orthographic_map_is_centered_on_the_track() {
        let records = vec![record(90, 85.15), record(30, 85.05)];
        let map = TrackMap::new("PS122", &track(), &records, ProjectionKind::Ortho).unwrap();

        assert_eq!(map.title, "PS122");
        assert_eq!(
            map.subtitle,
            "2019-10-01 00:30:00 UTC - 2019-10-01 01:30:00 UTC"
        );
        assert_eq!(map.track.len(), 5);
        assert_eq!(map.records.len(), 2);
        assert_eq!(map.outline.len(), 361);
        let (x, y) = map.track[2];
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12);
        assert!(!map.graticule.is_empty());
    }

    #[test]
    fn plate_map_skips_unpositioned_records() {
        let mut unpositioned = record(10, 0.0);
        unpositioned.latitude = None;
        let map = TrackMap::new("PS122", &track(), &[unpositioned], ProjectionKind::Plate).unwrap();
        assert!(map.records.is_empty());
        assert!(map.outline.is_empty());
        assert_eq!(map.subtitle, "2019-10-01 00:10:00 UTC - 2019-10-01 00:10:00 UTC");
        let ((lon_min, lon_max), (lat_min, lat_max)) = map.projection.bounds();
        assert_eq!((lon_min, lon_max), (112.0, 128.0));
        assert_eq!(lat_max, 90.0);
        assert!(lat_min < 85.0);
    }

    #[test]
    fn radiation_axes() {
        let stamps = [t0(), t0() + Duration::minutes(90)];
        assert_eq!(hours_since(t0(), &stamps), vec![0.0, 1.5]);
        assert_eq!(padded_range(&[5.0, 5.0]), (4.0, 6.0));
        assert_eq!(padded_range(&[0.0, 100.0]), (-5.0, 105.0));
        assert_eq!(padded_range(&[]), (0.0, 1.0));
    }
}
