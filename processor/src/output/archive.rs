use anyhow::Context;
use log::info;
use oceanetcore::Record;
use std::fs::File;
use std::io;
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::{ensure_parent_dir, LOG_TARGET};

/// Packs the source file of every record into a zip archive, each stored under
/// its `<dir>/<basename>` identifier. Returns the number of entries written.
pub fn write_archive(path: &Path, records: &[Record]) -> anyhow::Result<usize> {
    ensure_parent_dir(path)?;
    info!(
        target: LOG_TARGET,
        "Write {} files to archive {}",
        records.len(),
        path.display()
    );

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut archive = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for record in records {
        archive
            .start_file(record.file.as_str(), options)
            .with_context(|| format!("adding {} to archive", record.file))?;
        let mut source = File::open(&record.full_path)
            .with_context(|| format!("opening {}", record.full_path.display()))?;
        io::copy(&mut source, &mut archive)
            .with_context(|| format!("compressing {}", record.full_path.display()))?;
    }
    archive
        .finish()
        .with_context(|| format!("finishing {}", path.display()))?;
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;
    use std::io::Read;
    use tempfile::tempdir;

    #[test]
    fn stores_files_under_their_identifier() {
        let dir = tempdir().unwrap();
        let day = dir.path().join("2015-10-29");
        fs::create_dir(&day).unwrap();
        let source = day.join("002136_0001.JPG");
        fs::write(&source, b"not really a jpeg").unwrap();

        let records = vec![Record::new("2015-10-29/002136_0001.JPG", &source, Utc::now())];
        let path = dir.path().join("PS95_tsi.zip");
        assert_eq!(write_archive(&path, &records).unwrap(), 1);

        let mut zip = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut entry = zip.by_name("2015-10-29/002136_0001.JPG").unwrap();
        let mut contents = String::new();
        entry.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "not really a jpeg");
    }

    #[test]
    fn missing_source_file_is_an_error() {
        let dir = tempdir().unwrap();
        let records = vec![Record::new("d/x.JPG", dir.path().join("d/x.JPG"), Utc::now())];
        assert!(write_archive(&dir.path().join("out.zip"), &records).is_err());
    }
}
