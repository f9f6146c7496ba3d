//! Record collection from the level-0 archive.

pub mod images;
pub mod sensors;

pub use images::collect_images;
pub use sensors::collect_sensor_files;

use anyhow::{bail, Context};
use log::warn;
use std::fs;
use std::path::{Path, PathBuf};

const LOG_TARGET: &str = "oceanet.collect";

/// Directory part of a level-0 pattern, or `None` when that day has no
/// directory. Wildcards are only expanded in the file name component.
fn pattern_directory(pattern: &Path) -> anyhow::Result<Option<&Path>> {
    let directory = pattern.parent().unwrap_or_else(|| Path::new("."));
    if !directory.is_dir() {
        warn!(
            target: LOG_TARGET,
            "Data sub-directory does not exist: {}",
            directory.display()
        );
        return Ok(None);
    }
    if fs::read_dir(directory).is_err() {
        bail!("no read access to path {}", directory.display());
    }
    Ok(Some(directory))
}

/// Regular files matching a glob pattern, sorted by path.
fn expand_pattern(pattern: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let text = pattern
        .to_str()
        .with_context(|| format!("pattern {} is not valid UTF-8", pattern.display()))?;
    let mut files: Vec<PathBuf> = glob::glob(text)
        .with_context(|| format!("invalid file pattern {}", text))?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}
