//! # grove — source tree explorer core
//!
//! Indexes a directory tree and derives aggregate statistics, a phonetic
//! fuzzy-match search over file paths, and two cached downloadable artifacts
//! (a zip bundle and an RSS staleness feed).
//!
//! ## Library usage
//!
//! This crate is primarily a CLI tool / request handler, but core types and
//! the fuzzy matcher are exposed as a library for benchmarking and
//! integration testing.

use serde::{Deserialize, Serialize};

pub mod fuzzy;

// ─── Path helpers ────────────────────────────────────────────────────

/// Normalize a relative path to POSIX separators.
/// Manifest paths are `/`-separated regardless of platform.
#[must_use]
pub fn posix_path(p: &str) -> String {
    p.replace('\\', "/")
}

/// Final component of a `/`-separated relative path.
#[must_use]
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// First component of a `/`-separated relative path.
/// For a top-level entry this is the entry name itself.
#[must_use]
pub fn first_segment(path: &str) -> &str {
    path.split('/').next().unwrap_or(path)
}

/// Lowercased final extension of a file name, empty when there is none.
#[must_use]
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

// ─── Manifest types ──────────────────────────────────────────────────

/// One entry of a [`Manifest`] — a file or directory seen during the walk.
/// Immutable once created. Directories carry size 0 and an empty extension
/// so the manifest sum invariants hold exactly.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileEntry {
    /// POSIX-separated path relative to the indexed root, unique per manifest.
    pub relative_path: String,
    pub size: u64,
    /// Seconds since epoch.
    pub modified: u64,
    /// Lowercase, may be empty.
    pub extension: String,
}

/// The aggregated result of one full directory walk.
///
/// Built fresh per request; there is no cross-request identity and no
/// persisted form. An empty manifest means "nothing to show", not an error.
#[derive(Serialize, Debug, Default)]
pub struct Manifest {
    /// Traversal order: pre-order, parent before children.
    pub entries: Vec<FileEntry>,
    /// Sum of entry sizes.
    pub total_size: u64,
    /// Extension → cumulative bytes, sorted descending by bytes
    /// (ties break by extension name for determinism).
    pub extension_histogram: Vec<(String, u64)>,
    /// Max modified time across entries; 0 (the sentinel) when empty.
    pub freshest_modified: u64,
}

impl Manifest {
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One fuzzy search hit: the matched manifest path plus its edit-distance
/// cost between phonetic codes. A collection sorts ascending by cost with
/// ties preserving manifest order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub path: String,
    pub cost: u32,
}

/// An entry of a shallow, single-level directory listing.
/// Unlike [`FileEntry`], carries the `is_dir` flag for sibling listings.
#[derive(Serialize, Debug, Clone)]
pub struct ListEntry {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
    pub modified: u64,
}

// ─── Stats report ────────────────────────────────────────────────────

/// Renderable summary of a manifest — what the page/CLI consumer reads.
#[derive(Serialize, Debug)]
pub struct StatsReport {
    pub file_count: usize,
    pub total_size: u64,
    pub total_size_human: String,
    pub extension_histogram: Vec<(String, u64)>,
    pub freshest_modified: u64,
}

impl StatsReport {
    #[must_use]
    pub fn from_manifest(manifest: &Manifest) -> Self {
        StatsReport {
            file_count: manifest.file_count(),
            total_size: manifest.total_size,
            total_size_human: humanize_size(manifest.total_size, 1),
            extension_histogram: manifest.extension_histogram.clone(),
            freshest_modified: manifest.freshest_modified,
        }
    }
}

// ─── Humanizers ──────────────────────────────────────────────────────

/// Humanize a byte count: `39487001` → `37.7 MB`.
/// Always scales at least once, so small values read as fractional KB.
#[must_use]
pub fn humanize_size(bytes: u64, precision: usize) -> String {
    const UNITS: [&str; 8] = ["K", "M", "G", "T", "P", "E", "Z", "Y"];
    let mut val = bytes as f64;
    let mut unit = 0;
    loop {
        val /= 1024.0;
        if val < 1000.0 || unit == UNITS.len() - 1 {
            break;
        }
        unit += 1;
    }
    format!("{:.*} {}B", precision, val, UNITS[unit])
}

/// Friendly relative date: "3 days ago", "Yesterday", "Just now".
/// Both arguments are seconds since epoch; `then` in the future reads
/// as "Just now".
#[must_use]
pub fn friendly_date(then: u64, now: u64) -> String {
    let diff = now.saturating_sub(then);
    let minutes = diff / 60;
    let hours = diff / 3_600;
    let days = diff / 86_400;
    let months = diff / 2_592_000;
    let years = diff / 31_536_000;

    if years > 1 {
        format!("{} years ago", years)
    } else if months > 12 {
        "1 year ago".to_string()
    } else if months > 1 {
        format!("{} months ago", months)
    } else if months == 1 {
        "1 month ago".to_string()
    } else if days > 2 {
        format!("{} days ago", days)
    } else if days == 2 {
        "Yesterday".to_string()
    } else if hours > 1 {
        format!("{} hours ago", hours)
    } else if minutes >= 1 {
        format!("{} min ago", minutes)
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_posix_path_converts_backslashes() {
        assert_eq!(posix_path(r"src\cli\args.rs"), "src/cli/args.rs");
    }

    #[test]
    fn test_posix_path_leaves_forward_slashes() {
        assert_eq!(posix_path("src/cli/args.rs"), "src/cli/args.rs");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("src/cli/args.rs"), "args.rs");
        assert_eq!(base_name("README.md"), "README.md");
    }

    #[test]
    fn test_first_segment() {
        assert_eq!(first_segment("src/cli/args.rs"), "src");
        assert_eq!(first_segment("README.md"), "README.md");
    }

    #[test]
    fn test_extension_of_lowercases() {
        assert_eq!(extension_of("README.MD"), "md");
    }

    #[test]
    fn test_extension_of_none() {
        assert_eq!(extension_of("LICENSE"), "");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
    }

    #[test]
    fn test_extension_of_dotfile() {
        // `.gitignore` has no extension in the Path sense
        assert_eq!(extension_of(".gitignore"), "");
    }

    #[test]
    fn test_humanize_size_small() {
        assert_eq!(humanize_size(512, 1), "0.5 KB");
    }

    #[test]
    fn test_humanize_size_megabytes() {
        assert_eq!(humanize_size(39_487_001, 1), "37.7 MB");
    }

    #[test]
    fn test_humanize_size_zero() {
        assert_eq!(humanize_size(0, 0), "0 KB");
    }

    #[test]
    fn test_friendly_date_just_now() {
        assert_eq!(friendly_date(1000, 1030), "Just now");
    }

    #[test]
    fn test_friendly_date_minutes() {
        assert_eq!(friendly_date(0, 300), "5 min ago");
    }

    #[test]
    fn test_friendly_date_hours() {
        assert_eq!(friendly_date(0, 7_200), "2 hours ago");
    }

    #[test]
    fn test_friendly_date_yesterday() {
        assert_eq!(friendly_date(0, 2 * 86_400), "Yesterday");
    }

    #[test]
    fn test_friendly_date_days() {
        assert_eq!(friendly_date(0, 5 * 86_400), "5 days ago");
    }

    #[test]
    fn test_friendly_date_years() {
        assert_eq!(friendly_date(0, 3 * 31_536_000), "3 years ago");
    }

    #[test]
    fn test_friendly_date_future_is_just_now() {
        assert_eq!(friendly_date(5000, 1000), "Just now");
    }

    #[test]
    fn test_stats_report_from_empty_manifest() {
        let report = StatsReport::from_manifest(&Manifest::default());
        assert_eq!(report.file_count, 0);
        assert_eq!(report.total_size, 0);
        assert_eq!(report.freshest_modified, 0);
        assert!(report.extension_histogram.is_empty());
    }

    #[test]
    fn test_search_match_json_shape() {
        let m = SearchMatch { path: "src/hello.txt".to_string(), cost: 0 };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"path\":\"src/hello.txt\""));
        assert!(json.contains("\"cost\":0"));
    }
}

// ─── Property-based tests (proptest) ─────────────────────────────────

#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// posix_path is idempotent.
        #[test]
        fn posix_path_idempotent(input in "\\PC{0,100}") {
            let once = posix_path(&input);
            let twice = posix_path(&once);
            prop_assert_eq!(once, twice);
        }

        /// posix_path output never contains a backslash.
        #[test]
        fn posix_path_no_backslashes(input in "\\PC{0,100}") {
            prop_assert!(!posix_path(&input).contains('\\'));
        }

        /// base_name is a suffix of the input and contains no separator.
        #[test]
        fn base_name_is_final_component(input in "[a-zA-Z0-9_./-]{1,80}") {
            let base = base_name(&input);
            prop_assert!(input.ends_with(base));
            prop_assert!(!base.contains('/'));
        }

        /// extension_of output is always lowercase.
        #[test]
        fn extension_always_lowercase(name in "[a-zA-Z0-9_.]{1,40}") {
            let ext = extension_of(&name);
            prop_assert_eq!(ext.clone(), ext.to_lowercase());
        }

        /// humanize_size always renders a unit suffix ending in B.
        #[test]
        fn humanize_size_has_unit(bytes in 0u64..u64::MAX / 2, precision in 0usize..4) {
            let s = humanize_size(bytes, precision);
            prop_assert!(s.ends_with('B'), "no unit suffix in '{}'", s);
            prop_assert!(s.contains(' '));
        }

        /// friendly_date never panics and never returns an empty string.
        #[test]
        fn friendly_date_total(then in 0u64..u64::MAX / 2, now in 0u64..u64::MAX / 2) {
            prop_assert!(!friendly_date(then, now).is_empty());
        }
    }
}
