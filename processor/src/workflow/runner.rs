use anyhow::{bail, Context};
use log::info;
use oceanetcore::prelude::{ProcessingStage, StageInput};
use oceanetcore::processing::{assign_elapsed, PositionStage, WindowStage};
use oceanetcore::records::ExposureRule;
use oceanetcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use oceanetcore::track::{read_track, Track};
use oceanetcore::Record;
use std::path::PathBuf;

use crate::collect::collect_images;
use crate::output::plot::ProjectionKind;
use crate::output::{draw_track_map, write_archive, write_positions, TrackMap};
use crate::workflow::config::Selection;

const LOG_TARGET: &str = "oceanet.tsi";

pub const DEFAULT_MIN_RECORDS: usize = 100;

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Outputs are only written when more records than this remain.
    pub min_records: usize,
    pub archive: bool,
    pub plot: bool,
    pub projection: ProjectionKind,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            min_records: DEFAULT_MIN_RECORDS,
            archive: true,
            plot: true,
            projection: ProjectionKind::default(),
        }
    }
}

pub struct WorkflowResult {
    pub track: Track,
    pub records: Vec<Record>,
    pub window_notes: Vec<String>,
    pub metrics: MetricsSnapshot,
}

/// Files written by [`Runner::publish`].
#[derive(Debug, Default)]
pub struct Publication {
    pub table: PathBuf,
    pub archive: Option<PathBuf>,
    pub plot: Option<PathBuf>,
}

/// Image pipeline: track, collection, window filter, positions, publication.
pub struct Runner {
    selection: Selection,
    options: RunOptions,
    rule: ExposureRule,
}

impl Runner {
    pub fn new(selection: Selection, options: RunOptions) -> Self {
        Self {
            selection,
            options,
            rule: ExposureRule::default(),
        }
    }

    pub fn execute(&self) -> anyhow::Result<WorkflowResult> {
        let track_path = self.selection.track_path()?;
        if !track_path.is_file() {
            bail!("ship track file does not exist: {}", track_path.display());
        }
        let track = read_track(track_path)
            .with_context(|| format!("reading ship track {}", track_path.display()))?;

        let mut window_stage = WindowStage::new();
        window_stage
            .initialize(&track)
            .context("initializing window stage")?;
        let mut position_stage = PositionStage::new();
        position_stage
            .initialize(&track)
            .context("initializing position stage")?;

        let mut records = collect_images(
            &self.selection.instrument.path_level0_fix,
            &self.selection.patterns,
            &self.rule,
        )
        .context("collecting images")?;
        let metrics = MetricsRecorder::new();
        metrics.record_collected(records.len());
        assign_elapsed(&mut records, &track);

        let window_output = window_stage
            .execute(StageInput { records })
            .context("executing window stage")?;
        window_stage.cleanup();
        metrics.record_removed(window_output.metadata.removed);

        let position_output = position_stage
            .execute(StageInput {
                records: window_output.records,
            })
            .context("executing position stage")?;
        position_stage.cleanup();

        Ok(WorkflowResult {
            track,
            records: position_output.records,
            window_notes: window_output.metadata.notes,
            metrics: metrics.snapshot(),
        })
    }

    /// Writes the table, the archive and the map of a finished run.
    pub fn publish(&self, result: &WorkflowResult) -> anyhow::Result<Publication> {
        if result.records.len() <= self.options.min_records {
            bail!(
                "impossible to show track, too few records ({} <= {})",
                result.records.len(),
                self.options.min_records
            );
        }

        let stem = self.selection.output_stem();
        let instrument = &self.selection.instrument;

        let table = instrument.csv_output(&format!("{}.txt", stem))?;
        write_positions(&table, &result.records)
            .with_context(|| format!("writing {}", table.display()))?;
        let mut publication = Publication {
            table,
            ..Publication::default()
        };

        if self.options.archive {
            let archive = instrument.csv_output(&format!("{}.zip", stem))?;
            write_archive(&archive, &result.records)
                .with_context(|| format!("writing {}", archive.display()))?;
            publication.archive = Some(archive);
        }

        if self.options.plot {
            let plot = instrument
                .image_output(&format!("_{}_track.png", self.selection.mission_name))?;
            let map = TrackMap::new(
                &self.selection.mission_name,
                &result.track,
                &result.records,
                self.options.projection,
            )?;
            draw_track_map(&plot, &map).with_context(|| format!("plotting {}", plot.display()))?;
            publication.plot = Some(plot);
        }

        info!(
            target: LOG_TARGET,
            "Published {} records of {} to {}",
            result.records.len(),
            stem,
            publication.table.display()
        );
        Ok(publication)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::MetadataStore;
    use chrono::{Duration, NaiveDate};
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    /// Archive with a 4-hour track on 2015-10-29 and images every 10 minutes
    /// from 23:00 the day before until 06:00.
    fn fixture() -> (TempDir, Selection) {
        let dir = tempdir().unwrap();
        let root = dir.path();

        let mut track = String::from("Date/Time\tLatitude\tLongitude\n");
        for i in 0..=8 {
            track.push_str(&format!(
                "2015-10-29T{:02}:{:02}\t{:.3}\t{:.3}\n",
                i / 2,
                (i % 2) * 30,
                54.0 + 0.05 * i as f64,
                8.0 + 0.1 * i as f64
            ));
        }
        fs::write(root.join("track.txt"), track).unwrap();

        let start = NaiveDate::from_ymd_opt(2015, 10, 28)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        for step in 0..=42 {
            let ts = start + Duration::minutes(10 * step);
            let day = root.join("images").join(ts.format("%Y-%m-%d").to_string());
            fs::create_dir_all(&day).unwrap();
            fs::write(day.join(ts.format("%H%M%S_0001.JPG").to_string()), b"img").unwrap();
        }
        fs::create_dir(root.join("out")).unwrap();

        let instruments = format!(
            "[tsi]\npath_level0_fix = \"{images}\"\npath_filenames_level0 = \"%Y-%m-%d/*.JPG\"\n\
             path_level1a_csv = \"{out}/\"\npath_level1a_image = \"{out}/tsi\"\n",
            images = root.join("images").display(),
            out = root.join("out").display()
        );
        let missions = format!(
            "[PS95]\ndatetime_start = 2015-10-28\ndatetime_stopp = 2015-10-30\n\
             instruments = [\"tsi\"]\ntrack = \"{}\"\n",
            root.join("track.txt").display()
        );
        let selection = MetadataStore::from_toml(&instruments, &missions)
            .unwrap()
            .select("PS95", "tsi")
            .unwrap();
        (dir, selection)
    }

    fn options(min_records: usize) -> RunOptions {
        RunOptions {
            min_records,
            plot: false,
            ..RunOptions::default()
        }
    }

    #[test]
    fn runner_positions_records_inside_the_track() {
        let (_dir, selection) = fixture();
        let runner = Runner::new(selection, options(10));
        let result = runner.execute().unwrap();

        // 00:00 .. 04:00 inclusive, every 10 minutes
        assert_eq!(result.records.len(), 25);
        assert_eq!(
            result.metrics,
            MetricsSnapshot {
                collected: 43,
                removed: 18,
                retained: 25
            }
        );
        assert_eq!(result.window_notes, vec!["6 before track start", "12 after track end"]);
        let first = &result.records[0];
        assert_eq!(first.file, "2015-10-29/000000_0001.JPG");
        assert_eq!(first.position(), Some((54.0, 8.0)));
        assert!(result.records.iter().all(|r| r.position().is_some()));
    }

    #[test]
    fn publish_writes_table_and_archive() {
        let (dir, selection) = fixture();
        let runner = Runner::new(selection, options(10));
        let result = runner.execute().unwrap();
        let publication = runner.publish(&result).unwrap();

        assert_eq!(publication.table, dir.path().join("out/PS95_tsi.txt"));
        let table = fs::read_to_string(&publication.table).unwrap();
        assert_eq!(table.lines().count(), 26);
        let archive = publication.archive.unwrap();
        assert!(Path::new(&archive).is_file());
        assert!(publication.plot.is_none());
    }

    #[test]
    fn too_few_records_are_not_published() {
        let (dir, selection) = fixture();
        let runner = Runner::new(selection, options(25));
        let result = runner.execute().unwrap();
        let err = runner.publish(&result).unwrap_err();
        assert!(err.to_string().contains("too few records"));
        assert!(!dir.path().join("out/PS95_tsi.txt").exists());
    }

    #[test]
    fn missing_track_file_is_an_error() {
        let (dir, selection) = fixture();
        fs::remove_file(dir.path().join("track.txt")).unwrap();
        let runner = Runner::new(selection, options(10));
        let err = runner.execute().err().unwrap();
        assert!(err.to_string().contains("does not exist"));
    }
}
