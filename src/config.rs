//! Explorer configuration: compiled-in defaults merged with an optional
//! `config.json` at the explorer root.
//!
//! `{{dir}}` and `{{path}}` placeholders in title/description expand to the
//! root directory's base name and the web root respectively.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::index::ExclusionSet;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    /// Site title; may contain `{{dir}}` / `{{path}}` placeholders.
    pub title: String,
    pub description: String,
    /// Browseable subdirectories, in preference order. The first one that
    /// exists under the root is the indexed source tree.
    pub source_dirs: Vec<String>,
    pub allow_download: bool,
    /// Entry names excluded from indexing and listings.
    pub exclude: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            title: "{{dir}}".to_string(),
            description: "Source tree explorer for {{dir}}".to_string(),
            source_dirs: vec!["master".to_string(), "releases".to_string()],
            allow_download: true,
            exclude: vec![".git".to_string(), ".gitignore".to_string()],
        }
    }
}

impl Config {
    /// Load defaults merged with `<root>/config.json` when present.
    /// A malformed file is ignored with a warning, never fatal.
    pub fn load(root: &Path) -> Config {
        let path = root.join("config.json");
        match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Config>(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring malformed config.json");
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }

    /// Expand title/description placeholders for a given root and web root.
    pub fn expand_placeholders(&mut self, root: &Path, webroot: &str) {
        let dir = root
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
            .to_string();
        for field in [&mut self.title, &mut self.description] {
            *field = field.replace("{{dir}}", &dir).replace("{{path}}", webroot);
        }
    }

    /// The indexed source tree: the first configured subdirectory that
    /// exists under `root`, falling back to the first configured name
    /// (which then indexes as an empty tree).
    #[must_use]
    pub fn source_dir(&self, root: &Path) -> PathBuf {
        for name in &self.source_dirs {
            let candidate = root.join(name.trim_matches('/'));
            if candidate.is_dir() {
                return candidate;
            }
        }
        root.join(
            self.source_dirs
                .first()
                .map(String::as_str)
                .unwrap_or("master"),
        )
    }

    #[must_use]
    pub fn exclusions(&self) -> ExclusionSet {
        ExclusionSet::new(self.exclude.iter().cloned())
    }
}
