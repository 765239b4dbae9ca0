//! The request boundary: a raw query string becomes an immutable [`Query`]
//! once, and every handler returns a [`Response`] value. Nothing downstream
//! re-parses request state.

use std::path::{Component, Path, PathBuf};

use tracing::{info, warn};

use crate::archive::build_archive;
use crate::config::Config;
use crate::error::ExplorerError;
use crate::feed::feed_bytes;
use crate::index::build_manifest;
use grove::{StatsReport, base_name, fuzzy};

// ─── Query ───────────────────────────────────────────────────────────

/// What the request asks for. Parameters are checked in a fixed priority
/// order, so `?zip&s=x` is an archive request and the search term is
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// No recognized parameter: the index itself.
    Index,
    Search(String),
    Zip,
    Download,
    Raw,
    Feed,
}

impl Query {
    /// Parse a raw query string (the part after `?`, possibly empty).
    #[must_use]
    pub fn parse(raw: &str) -> Query {
        let mut search = None;
        let mut has_zip = false;
        let mut has_download = false;
        let mut has_raw = false;
        let mut has_feed = false;

        for pair in raw.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((k, v)) => (k, v),
                None => (pair, ""),
            };
            match key {
                "zip" => has_zip = true,
                "s" => search = Some(value.replace('+', " ")),
                "d" => has_download = true,
                "raw" => has_raw = true,
                "feed" => has_feed = true,
                _ => {}
            }
        }

        if has_zip {
            Query::Zip
        } else if let Some(term) = search {
            Query::Search(term)
        } else if has_download {
            Query::Download
        } else if has_raw {
            Query::Raw
        } else if has_feed {
            Query::Feed
        } else {
            Query::Index
        }
    }
}

/// Everything a handler needs, fixed at the boundary.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Requested path relative to the explorer root, slash separated.
    pub path: String,
    pub query: Query,
    /// Absolute URL of the explorer itself, used in feed links.
    pub self_url: String,
}

impl RequestContext {
    #[must_use]
    pub fn new(path: &str, raw_query: &str, self_url: &str) -> RequestContext {
        RequestContext {
            path: path.trim_matches('/').to_string(),
            query: Query::parse(raw_query),
            self_url: self_url.to_string(),
        }
    }
}

// ─── Response ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    #[must_use]
    pub fn with_body(status: u16, content_type: &str, body: Vec<u8>) -> Response {
        Response {
            status,
            headers: vec![
                ("Content-Type".to_string(), content_type.to_string()),
                ("Content-Length".to_string(), body.len().to_string()),
            ],
            body,
        }
    }

    #[must_use]
    pub fn not_found(message: &str) -> Response {
        Response::with_body(404, "text/plain; charset=utf-8", message.as_bytes().to_vec())
    }

    /// Attachment download with a sniffed content type.
    #[must_use]
    pub fn attachment(filename: &str, body: Vec<u8>) -> Response {
        let mime = mime_guess::from_path(filename).first_or_octet_stream();
        let mut response = Response::with_body(200, mime.essence_str(), body);
        response.headers.push((
            "Content-Disposition".to_string(),
            format!("attachment; filename=\"{filename}\""),
        ));
        response
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ─── Handlers ────────────────────────────────────────────────────────

/// Resolve the request path to a real file under `root`. Rejects parent
/// traversal, absolute paths and any segment in the exclusion list.
fn safe_file(root: &Path, request_path: &str, config: &Config) -> Option<PathBuf> {
    if request_path.is_empty() {
        return None;
    }
    let filter = config.exclusions();
    let relative = Path::new(request_path);
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                if filter.contains(&segment.to_string_lossy()) {
                    return None;
                }
            }
            _ => return None,
        }
    }
    let full = root.join(relative);
    full.is_file().then_some(full)
}

fn serve_zip(root: &Path, config: &Config) -> Result<Response, ExplorerError> {
    let source = config.source_dir(root);
    let manifest = build_manifest(&source, &config.exclusions());
    let archive_name = format!("{}.zip", base_name(&root.to_string_lossy()));
    let archive_path = root.join(&archive_name);

    let paths: Vec<String> = manifest.entries.iter().map(|e| e.relative_path.clone()).collect();
    if let Err(e) = build_archive(&paths, &archive_path, &source) {
        warn!(archive = %archive_path.display(), error = %e, "Archive build failed");
        return Ok(Response::with_body(
            500,
            "text/plain; charset=utf-8",
            b"Could not build the archive.".to_vec(),
        ));
    }
    // Trivial success on an empty tree creates no artifact.
    if !archive_path.exists() {
        return Ok(Response::not_found("Nothing to archive."));
    }

    let bytes = std::fs::read(&archive_path)?;
    // The whole-tree archive is one-shot: built, sent, deleted. Per-file
    // downloads are plain reads and never touch the archive cache.
    std::fs::remove_file(&archive_path)?;
    info!(archive = %archive_name, bytes = bytes.len(), "Serving one-shot archive");
    Ok(Response::attachment(&archive_name, bytes))
}

fn serve_search(term: &str, root: &Path, config: &Config) -> Response {
    if term.is_empty() {
        return Response::with_body(200, "application/json", b"[]".to_vec());
    }
    let manifest = build_manifest(&config.source_dir(root), &config.exclusions());
    let matches = fuzzy::search(term, &manifest.entries);
    match serde_json::to_vec(&matches) {
        Ok(body) => Response::with_body(200, "application/json", body),
        Err(e) => {
            warn!(error = %e, "Search result serialization failed");
            Response::with_body(500, "application/json", b"[]".to_vec())
        }
    }
}

fn serve_stats(root: &Path, config: &Config) -> Result<Response, ExplorerError> {
    let manifest = build_manifest(&config.source_dir(root), &config.exclusions());
    let report = StatsReport::from_manifest(&manifest);
    let body = serde_json::to_vec_pretty(&report)?;
    Ok(Response::with_body(200, "application/json", body))
}

/// Dispatch one request. Every path through here produces a `Response`;
/// only I/O failures reading files the explorer itself just located
/// surface as errors.
pub fn respond(ctx: &RequestContext, root: &Path, config: &Config) -> Result<Response, ExplorerError> {
    match &ctx.query {
        Query::Zip => {
            if !config.allow_download {
                return Ok(Response::with_body(
                    403,
                    "text/plain; charset=utf-8",
                    b"Downloads are disabled.".to_vec(),
                ));
            }
            serve_zip(root, config)
        }
        Query::Search(term) => Ok(serve_search(term, root, config)),
        Query::Download => {
            if !config.allow_download {
                return Ok(Response::with_body(
                    403,
                    "text/plain; charset=utf-8",
                    b"Downloads are disabled.".to_vec(),
                ));
            }
            match safe_file(root, &ctx.path, config) {
                Some(file) => {
                    let bytes = std::fs::read(&file)?;
                    Ok(Response::attachment(base_name(&ctx.path), bytes))
                }
                None => Ok(Response::not_found("No such file.")),
            }
        }
        Query::Raw => match safe_file(root, &ctx.path, config) {
            Some(file) => {
                let bytes = std::fs::read(&file)?;
                Ok(Response::with_body(200, "text/plain; charset=utf-8", bytes))
            }
            None => Ok(Response::not_found("No such file.")),
        },
        Query::Feed => {
            let manifest = build_manifest(&config.source_dir(root), &config.exclusions());
            let bytes = feed_bytes(&manifest, &root.join("feed.rss"), &ctx.self_url, config)?;
            Ok(Response::with_body(200, "application/rss+xml; charset=utf-8", bytes))
        }
        Query::Index => serve_stats(root, config),
    }
}

#[cfg(test)]
mod request_tests {
    use super::*;

    #[test]
    fn test_query_parse_priority() {
        assert_eq!(Query::parse(""), Query::Index);
        assert_eq!(Query::parse("zip"), Query::Zip);
        assert_eq!(Query::parse("s=hello"), Query::Search("hello".to_string()));
        assert_eq!(Query::parse("zip&s=hello"), Query::Zip);
        assert_eq!(Query::parse("s=x&d"), Query::Search("x".to_string()));
        assert_eq!(Query::parse("d"), Query::Download);
        assert_eq!(Query::parse("raw"), Query::Raw);
        assert_eq!(Query::parse("d&raw"), Query::Download);
        assert_eq!(Query::parse("feed"), Query::Feed);
        assert_eq!(Query::parse("unknown=1"), Query::Index);
    }

    #[test]
    fn test_query_parse_plus_decodes_to_space() {
        assert_eq!(Query::parse("s=two+words"), Query::Search("two words".to_string()));
    }

    #[test]
    fn test_context_trims_path_slashes() {
        let ctx = RequestContext::new("/master/a.txt/", "d", "http://x/");
        assert_eq!(ctx.path, "master/a.txt");
        assert_eq!(ctx.query, Query::Download);
    }

    #[test]
    fn test_response_header_lookup_case_insensitive() {
        let r = Response::with_body(200, "text/plain; charset=utf-8", b"ok".to_vec());
        assert_eq!(r.header("content-type"), Some("text/plain; charset=utf-8"));
        assert_eq!(r.header("Content-Length"), Some("2"));
        assert_eq!(r.header("X-Missing"), None);
    }

    #[test]
    fn test_attachment_sniffs_mime_and_disposition() {
        let r = Response::attachment("report.json", b"{}".to_vec());
        assert_eq!(r.header("Content-Type"), Some("application/json"));
        assert_eq!(
            r.header("Content-Disposition"),
            Some("attachment; filename=\"report.json\"")
        );
    }

    #[test]
    fn test_safe_file_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("ok.txt"), b"ok").unwrap();
        let config = Config::default();
        assert!(safe_file(tmp.path(), "ok.txt", &config).is_some());
        assert!(safe_file(tmp.path(), "../ok.txt", &config).is_none());
        assert!(safe_file(tmp.path(), "/etc/passwd", &config).is_none());
        assert!(safe_file(tmp.path(), "", &config).is_none());
    }

    #[test]
    fn test_safe_file_rejects_excluded_segments() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join(".git")).unwrap();
        std::fs::write(tmp.path().join(".git/config"), b"secret").unwrap();
        assert!(safe_file(tmp.path(), ".git/config", &Config::default()).is_none());
    }
}
