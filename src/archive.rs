//! Existence-cached zip archives.
//!
//! An archive is built at most once per path: if the file already exists it
//! is served as-is, whatever has changed on disk since. Cache invalidation
//! is deleting the file.

use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Instant;

use tracing::{info, warn};
use zip::CompressionMethod;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::error::ExplorerError;
use grove::base_name;

fn write_archive(
    relative_paths: &[String],
    archive_path: &Path,
    index_root: &Path,
) -> Result<(), ExplorerError> {
    let file = File::create(archive_path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let prefix = base_name(&index_root.to_string_lossy()).to_string();

    for relative in relative_paths {
        let source = index_root.join(relative);
        let stored = format!("{prefix}/{relative}");
        if source.is_dir() {
            writer.add_directory(stored.as_str(), options)?;
        } else if source.is_file() {
            writer.start_file(stored.as_str(), options)?;
            let mut reader = File::open(&source)?;
            io::copy(&mut reader, &mut writer)?;
        } else {
            warn!(path = %source.display(), "Skipping vanished entry while archiving");
        }
    }
    writer.finish()?;
    Ok(())
}

/// Build the archive at `archive_path` from the listed paths (relative to
/// `index_root`) unless it already exists. An empty input list is trivial
/// success and creates no file, so callers must check for the artifact
/// before serving it. Returns whether the file exists after the build; a
/// failed build removes the partial file before the error propagates.
pub fn build_archive(
    relative_paths: &[String],
    archive_path: &Path,
    index_root: &Path,
) -> Result<bool, ExplorerError> {
    if archive_path.exists() {
        return Ok(true);
    }
    if relative_paths.is_empty() {
        return Ok(true);
    }

    let start = Instant::now();
    if let Err(e) = write_archive(relative_paths, archive_path, index_root) {
        let _ = std::fs::remove_file(archive_path);
        return Err(e);
    }

    info!(
        archive = %archive_path.display(),
        entries = relative_paths.len(),
        elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
        "Archive built"
    );
    Ok(archive_path.exists())
}
