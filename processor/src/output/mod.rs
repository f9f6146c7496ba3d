//! Publication files: position table, source archive, NetCDF and plots.

pub mod archive;
pub mod cfjson;
pub mod netcdf;
pub mod plot;
pub mod table;

pub use archive::write_archive;
pub use cfjson::CfJson;
pub use netcdf::{write_radiation_dataset, NetCdfError};
pub use plot::{draw_radiation_series, draw_track_map, TrackMap};
pub use table::write_positions;

use anyhow::bail;
use std::path::Path;

const LOG_TARGET: &str = "oceanet.output";

/// Fails unless the directory that will receive `path` exists.
pub fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => return Ok(()),
    };
    if !parent.is_dir() {
        bail!("output directory does not exist: {}", parent.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parent_must_exist() {
        let dir = tempdir().unwrap();
        assert!(ensure_parent_dir(&dir.path().join("PS95_tsi.txt")).is_ok());
        assert!(ensure_parent_dir(Path::new("PS95_tsi.txt")).is_ok());
        let err = ensure_parent_dir(&dir.path().join("csv/PS95_tsi.txt")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
