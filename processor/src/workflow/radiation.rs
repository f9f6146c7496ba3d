use anyhow::{bail, Context};
use chrono::Utc;
use log::{info, warn};
use oceanetcore::records::SensorBatch;
use std::path::PathBuf;

use crate::collect::collect_sensor_files;
use crate::output::{draw_radiation_series, ensure_parent_dir, write_radiation_dataset, CfJson};
use crate::workflow::config::Selection;

const LOG_TARGET: &str = "oceanet.radiation";

/// What to do with readings that repeat an earlier timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DuplicatePolicy {
    /// Publish every reading, flagged in the file name.
    Keep,
    /// Keep the first reading of each timestamp.
    #[default]
    Drop,
}

#[derive(Debug, Clone)]
pub struct RadiationOptions {
    pub duplicates: DuplicatePolicy,
    /// CF-JSON metadata template.
    pub template: PathBuf,
    pub output_dir: PathBuf,
    pub plot: bool,
}

#[derive(Debug)]
pub struct RadiationResult {
    pub readings: usize,
    pub duplicates: usize,
    pub dataset: PathBuf,
    pub plot: Option<PathBuf>,
}

/// Applies the duplicate policy and returns the dataset file name.
fn resolve_duplicates(batch: &mut SensorBatch, policy: DuplicatePolicy, stem: &str) -> (usize, String) {
    let duplicates = batch.duplicate_count();
    if duplicates == 0 {
        return (0, format!("{}.nc", stem));
    }
    match policy {
        DuplicatePolicy::Keep => {
            warn!(
                target: LOG_TARGET,
                "{} duplicated timestamps are kept in the dataset", duplicates
            );
            (duplicates, format!("{}.nc_include_duplicates.nc", stem))
        }
        DuplicatePolicy::Drop => {
            let removed = batch.drop_duplicates();
            info!(
                target: LOG_TARGET,
                "{} readings with duplicated timestamps removed, first occurrence kept", removed
            );
            (removed, format!("{}.nc", stem))
        }
    }
}

/// Radiation pipeline: station files, duplicate handling, CF metadata, NetCDF.
pub struct RadiationRun {
    selection: Selection,
    options: RadiationOptions,
}

impl RadiationRun {
    pub fn new(selection: Selection, options: RadiationOptions) -> Self {
        Self { selection, options }
    }

    pub fn execute(&self) -> anyhow::Result<RadiationResult> {
        let mut batch =
            collect_sensor_files(&self.selection.patterns).context("collecting sensor files")?;
        let stem = self.selection.output_stem();
        let (duplicates, file_name) =
            resolve_duplicates(&mut batch, self.options.duplicates, &stem);
        if !batch.is_monotonic() {
            bail!("dataset is not sorted by time");
        }

        let mut cf = CfJson::read(&self.options.template)?;
        cf.populate_radiation(&self.selection.mission_name, &batch, Utc::now())
            .context("filling metadata template")?;

        let dataset = self.options.output_dir.join(file_name);
        ensure_parent_dir(&dataset)?;
        write_radiation_dataset(&dataset, &cf)
            .with_context(|| format!("writing {}", dataset.display()))?;

        let plot = if self.options.plot {
            let path = self.options.output_dir.join(format!("{}_radiation.png", stem));
            draw_radiation_series(&path, &stem, &batch)?;
            Some(path)
        } else {
            None
        };

        Ok(RadiationResult {
            readings: batch.len(),
            duplicates,
            dataset,
            plot,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::cfjson::tests::TEMPLATE;
    use crate::workflow::config::MetadataStore;
    use oceanetcore::records::parse_scaw;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn scaw_line(ts: &str, dsr: f64) -> String {
        let mut cols = vec!["0".to_string(); 21];
        cols[0] = format!("\"{}\"", ts);
        cols[5] = "85.1".into();
        cols[6] = "120.5".into();
        cols[19] = dsr.to_string();
        cols[20] = "230.0".into();
        cols.join(",")
    }

    fn duplicated_batch() -> SensorBatch {
        let text = [
            scaw_line("2019-10-01 00:00:00", 1.0),
            scaw_line("2019-10-01 00:00:00", 9.0),
            scaw_line("2019-10-01 00:01:00", 2.0),
        ]
        .join("\n");
        parse_scaw(text.as_bytes()).unwrap()
    }

    #[test]
    fn keep_policy_flags_the_file_name() {
        let mut batch = duplicated_batch();
        let (count, name) = resolve_duplicates(&mut batch, DuplicatePolicy::Keep, "PS122_scaw1");
        assert_eq!((count, name.as_str()), (1, "PS122_scaw1.nc_include_duplicates.nc"));
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn drop_policy_keeps_first_occurrence() {
        let mut batch = duplicated_batch();
        let (count, name) = resolve_duplicates(&mut batch, DuplicatePolicy::Drop, "PS122_scaw1");
        assert_eq!((count, name.as_str()), (1, "PS122_scaw1.nc"));
        assert_eq!(batch.column(|r| r.dsr), vec![1.0, 2.0]);
        assert!(batch.is_monotonic());
    }

    fn fixture(template: bool) -> (TempDir, RadiationRun) {
        let dir = tempdir().unwrap();
        let data = dir.path().join("SCAW");
        fs::create_dir(&data).unwrap();
        fs::write(
            data.join("SCAW1_20191001.dat"),
            [
                scaw_line("2019-10-01 00:00:00", 1.0),
                scaw_line("2019-10-01 00:01:00", 2.0),
            ]
            .join("\n"),
        )
        .unwrap();
        let meta = dir.path().join("scaw1_js_meta.json");
        if template {
            fs::write(&meta, TEMPLATE).unwrap();
        }

        let instruments = format!(
            "[scaw1]\npath_level0_fix = \"{}\"\npath_filenames_level0 = \"SCAW1_%Y%m%d.dat\"\n",
            data.display()
        );
        let missions = "[PS122]\ndatetime_start = 2019-10-01\ndatetime_stopp = 2019-10-02\ninstruments = [\"scaw1\"]\n";
        let selection = MetadataStore::from_toml(&instruments, missions)
            .unwrap()
            .select("PS122", "scaw1")
            .unwrap();
        let run = RadiationRun::new(
            selection,
            RadiationOptions {
                duplicates: DuplicatePolicy::Drop,
                template: meta,
                output_dir: dir.path().to_path_buf(),
                plot: false,
            },
        );
        (dir, run)
    }

    #[test]
    fn missing_template_is_an_error() {
        let (_dir, run) = fixture(false);
        let err = run.execute().unwrap_err();
        assert!(err.to_string().contains("metadata template does not exist"));
    }

    #[cfg(not(feature = "netcdf"))]
    #[test]
    fn dataset_needs_the_netcdf_feature() {
        use crate::output::NetCdfError;

        let (_dir, run) = fixture(true);
        let err = run.execute().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<NetCdfError>(),
            Some(NetCdfError::FeatureDisabled)
        ));
    }

    #[cfg(feature = "netcdf")]
    #[test]
    fn writes_dataset_next_to_output_dir() {
        let (dir, run) = fixture(true);
        let result = run.execute().unwrap();
        assert_eq!(result.readings, 2);
        assert_eq!(result.duplicates, 0);
        assert_eq!(result.dataset, dir.path().join("PS122_scaw1.nc"));
        assert!(result.dataset.is_file());
    }
}
