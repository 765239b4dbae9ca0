//! Directory indexing: the path filter and the manifest builder.
//!
//! The walk is a full re-walk on every call — there is no persisted index
//! and no cross-request cache; the OS page cache does the heavy lifting.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Instant, UNIX_EPOCH};

use tracing::{debug, info, warn};

use grove::{FileEntry, Manifest, extension_of, first_segment, posix_path};

// ─── Path filter ─────────────────────────────────────────────────────

/// Names excluded from indexing. One top-level name in the set hides the
/// entire subtree beneath it via the first-segment rule, without per-entry
/// checks deep in the walk.
#[derive(Debug, Clone)]
pub struct ExclusionSet(HashSet<String>);

impl Default for ExclusionSet {
    fn default() -> Self {
        ExclusionSet::new([".git".to_string(), ".gitignore".to_string()])
    }
}

impl ExclusionSet {
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        ExclusionSet(names.into_iter().collect())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Pure exclusion decision for one directory entry.
    /// Always excludes `.` and `..`, symlinks regardless of target, names
    /// in the set, and anything whose first path segment is in the set.
    #[must_use]
    pub fn is_excluded(&self, name: &str, first_segment: &str, is_symlink: bool) -> bool {
        name == "."
            || name == ".."
            || is_symlink
            || self.0.contains(name)
            || self.0.contains(first_segment)
    }
}

// ─── Manifest builder ────────────────────────────────────────────────

fn modified_secs(meta: &std::fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Walk `root` and build a [`Manifest`].
///
/// Iterative depth-first pre-order traversal with an explicit stack of
/// pending directories: a directory's own entry is appended before any of
/// its contents ("self first"). A missing or non-directory root yields an
/// empty manifest. Entries that fail to stat are skipped and the walk
/// continues — a partial listing beats total failure in a browsing tool.
#[must_use]
pub fn build_manifest(root: &Path, filter: &ExclusionSet) -> Manifest {
    let mut manifest = Manifest::default();
    if !root.is_dir() {
        debug!(root = %root.display(), "Index root missing or not a directory, empty manifest");
        return manifest;
    }

    let start = Instant::now();
    let mut seen: HashSet<String> = HashSet::new();
    let mut histogram: HashMap<String, u64> = HashMap::new();
    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                continue;
            }
        };

        let mut subdirs: Vec<PathBuf> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let relative = match path.strip_prefix(root) {
                Ok(rel) => posix_path(&rel.to_string_lossy()),
                Err(_) => continue,
            };

            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                    continue;
                }
            };
            // DirEntry::metadata does not follow symlinks.
            if filter.is_excluded(&name, first_segment(&relative), meta.is_symlink()) {
                continue;
            }

            if seen.insert(relative.clone()) {
                let is_dir = meta.is_dir();
                let size = if is_dir { 0 } else { meta.len() };
                let extension = if is_dir { String::new() } else { extension_of(&name) };
                let modified = modified_secs(&meta);

                manifest.total_size += size;
                if !extension.is_empty() {
                    *histogram.entry(extension.clone()).or_insert(0) += size;
                }
                if modified > manifest.freshest_modified {
                    manifest.freshest_modified = modified;
                }
                manifest.entries.push(FileEntry {
                    relative_path: relative,
                    size,
                    modified,
                    extension,
                });

                if is_dir {
                    subdirs.push(path);
                }
            }
        }

        // Descend in listing order: last pushed is walked first.
        stack.extend(subdirs.into_iter().rev());
    }

    let mut histogram: Vec<(String, u64)> = histogram.into_iter().collect();
    histogram.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    manifest.extension_histogram = histogram;

    info!(
        root = %root.display(),
        entries = manifest.file_count(),
        total_bytes = manifest.total_size,
        elapsed_ms = format_args!("{:.1}", start.elapsed().as_secs_f64() * 1000.0),
        "Manifest built"
    );

    manifest
}
