use anyhow::{bail, Context};
use log::{debug, info};
use oceanetcore::records::ExposureRule;
use oceanetcore::Record;
use std::path::{Path, PathBuf};

use super::{expand_pattern, pattern_directory, LOG_TARGET};

/// Collects every image matched by the daily level-0 patterns and derives its
/// exposure time. Days without a directory are skipped.
pub fn collect_images(
    data_root: &Path,
    patterns: &[PathBuf],
    rule: &ExposureRule,
) -> anyhow::Result<Vec<Record>> {
    if !data_root.is_dir() {
        bail!("data directory does not exist: {}", data_root.display());
    }
    info!(target: LOG_TARGET, "Collect images below {}", data_root.display());

    let mut records = Vec::new();
    for pattern in patterns {
        let Some(directory) = pattern_directory(pattern)? else {
            continue;
        };

        let files = expand_pattern(pattern)?;
        info!(
            target: LOG_TARGET,
            "Found {:>5} image files in directory {}",
            files.len(),
            directory.display()
        );
        for file in files {
            let exposure = rule
                .derive(&file)
                .with_context(|| format!("deriving exposure time of {}", file.display()))?;
            debug!(
                target: LOG_TARGET,
                "{} taken at {} ({:?})",
                exposure.file(),
                exposure.timestamp,
                exposure.source
            );
            records.push(exposure.into_record(file));
        }
    }

    if records.is_empty() {
        bail!("in total no images were found below {}", data_root.display());
    }
    info!(target: LOG_TARGET, "In total {} images were found", records.len());
    Ok(records)
}
