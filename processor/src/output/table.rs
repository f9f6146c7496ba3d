use anyhow::Context;
use log::info;
use oceanetcore::Record;
use std::path::Path;

use super::{ensure_parent_dir, LOG_TARGET};

pub const HEADER: [&str; 5] = [
    "DateTime [UTC]",
    "Latitude",
    "Longitude",
    "File",
    "FileFullPath",
];

const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S %z";

/// Writes the positioned records as a tab-separated table.
pub fn write_positions(path: &Path, records: &[Record]) -> anyhow::Result<()> {
    ensure_parent_dir(path)?;
    info!(target: LOG_TARGET, "Write {} records to {}", records.len(), path.display());

    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(HEADER)?;

    for record in records {
        let (latitude, longitude) = record
            .position()
            .with_context(|| format!("record {} has no position", record.file))?;
        writer.write_record([
            record.timestamp.format(DATETIME_FORMAT).to_string(),
            format!("{:.5}", latitude),
            format!("{:.5}", longitude),
            record.file.clone(),
            record.full_path.display().to_string(),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
