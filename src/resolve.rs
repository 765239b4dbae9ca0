//! Shallow directory listings and case-insensitive name resolution.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::warn;

use crate::index::ExclusionSet;
use grove::ListEntry;

/// One directory level, keyed by lowercased entry name. The value keeps the
/// name's on-disk casing so resolution stays case-insensitive while results
/// point at real paths.
pub type NameIndex = HashMap<String, ListEntry>;

/// Read a single directory level into a [`NameIndex`]. Only direct children
/// are listed; names in the filter are omitted. An unreadable directory
/// yields an empty index.
#[must_use]
pub fn list_directory(dir: &Path, filter: &ExclusionSet) -> NameIndex {
    let mut index = NameIndex::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Cannot list directory");
            return index;
        }
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == "." || name == ".." || filter.contains(&name) {
            continue;
        }
        let Ok(meta) = entry.metadata() else { continue };
        let modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs())
            .unwrap_or(0);
        index.insert(
            name.to_lowercase(),
            ListEntry {
                name,
                is_dir: meta.is_dir(),
                size: if meta.is_dir() { 0 } else { meta.len() },
                modified,
            },
        );
    }
    index
}

/// Listing order for display: directories first, then files, each group
/// sorted by lowercased name.
#[must_use]
pub fn sorted_entries(index: &NameIndex) -> Vec<ListEntry> {
    let mut entries: Vec<ListEntry> = index.values().cloned().collect();
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    entries
}

/// Resolve a bare name against a directory listing by trying each candidate
/// suffix in order. Every candidate is tried and the last hit wins, so later
/// suffixes shadow earlier ones. The hit must still exist on disk under
/// `dir` at resolution time.
#[must_use]
pub fn resolve(base_name: &str, index: &NameIndex, candidates: &[&str], dir: &Path) -> Option<PathBuf> {
    let base = base_name.to_lowercase();
    let mut resolved = None;
    for suffix in candidates {
        let key = format!("{base}{suffix}").to_lowercase();
        if let Some(entry) = index.get(&key) {
            let path = dir.join(&entry.name);
            if path.exists() {
                resolved = Some(path);
            }
        }
    }
    resolved
}

#[cfg(test)]
mod resolve_tests {
    use super::*;
    use std::fs;

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("README.md"), b"# readme").unwrap();
        fs::write(tmp.path().join("readme.txt"), b"plain").unwrap();
        fs::write(tmp.path().join("LICENSE"), b"mit").unwrap();
        fs::create_dir(tmp.path().join("docs")).unwrap();
        tmp
    }

    #[test]
    fn test_listing_skips_filtered_names() {
        let tmp = fixture();
        fs::create_dir(tmp.path().join(".git")).unwrap();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        assert!(!index.contains_key(".git"));
        assert!(index.contains_key("readme.md"));
    }

    #[test]
    fn test_listing_keys_are_lowercase_values_keep_casing() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        assert_eq!(index.get("license").unwrap().name, "LICENSE");
    }

    #[test]
    fn test_sorted_entries_directories_first() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        let names: Vec<String> = sorted_entries(&index).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["docs", "LICENSE", "README.md", "readme.txt"]);
    }

    #[test]
    fn test_resolve_last_candidate_wins() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        // both readme.txt and README.md exist: the later suffix shadows
        let hit = resolve("readme", &index, &["", ".txt", ".md"], tmp.path()).unwrap();
        assert_eq!(hit, tmp.path().join("README.md"));
    }

    #[test]
    fn test_resolve_bare_name() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        let hit = resolve("license", &index, &["", ".txt", ".md"], tmp.path()).unwrap();
        assert_eq!(hit, tmp.path().join("LICENSE"));
    }

    #[test]
    fn test_resolve_case_insensitive() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        let hit = resolve("LICENSE", &index, &[""], tmp.path()).unwrap();
        assert_eq!(hit, tmp.path().join("LICENSE"));
    }

    #[test]
    fn test_resolve_miss() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        assert!(resolve("changelog", &index, &["", ".txt", ".md"], tmp.path()).is_none());
    }

    #[test]
    fn test_resolve_requires_on_disk_presence() {
        let tmp = fixture();
        let index = list_directory(tmp.path(), &ExclusionSet::default());
        fs::remove_file(tmp.path().join("README.md")).unwrap();
        // index is now stale; the .md hit must be rejected and .txt wins
        let hit = resolve("readme", &index, &["", ".txt", ".md"], tmp.path()).unwrap();
        assert_eq!(hit, tmp.path().join("readme.txt"));
    }

    #[test]
    fn test_unreadable_directory_yields_empty_index() {
        let index = list_directory(Path::new("/nonexistent/grove"), &ExclusionSet::default());
        assert!(index.is_empty());
    }
}
