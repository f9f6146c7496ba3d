use anyhow::{bail, Context};
use log::{info, warn};
use oceanetcore::records::{parse_scaw, SensorBatch};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use super::{expand_pattern, pattern_directory, LOG_TARGET};

/// Reads every SCAW file matched by the level-0 patterns into one time-ordered batch.
pub fn collect_sensor_files(patterns: &[PathBuf]) -> anyhow::Result<SensorBatch> {
    let mut batch = SensorBatch::default();
    let mut files_read = 0usize;

    for pattern in patterns {
        if pattern_directory(pattern)?.is_none() {
            continue;
        }
        let files = expand_pattern(pattern)?;
        if files.is_empty() {
            warn!(target: LOG_TARGET, "File does not exist: {}", pattern.display());
            continue;
        }
        for path in files {
            info!(target: LOG_TARGET, "Read sensor file {}", path.display());
            let file = File::open(&path)
                .with_context(|| format!("opening sensor file {}", path.display()))?;
            let readings = parse_scaw(BufReader::new(file))
                .with_context(|| format!("parsing sensor file {}", path.display()))?;
            batch.merge(readings);
            files_read += 1;
        }
    }

    if batch.is_empty() {
        bail!("no sensor readings found in {} files", files_read);
    }
    info!(
        target: LOG_TARGET,
        "{} readings collected from {} files",
        batch.len(),
        files_read
    );
    Ok(batch)
}
