//! RSS 2.0 feed rendering with mtime-based staleness.
//!
//! The generated file doubles as the cache: the feed is rewritten only when
//! its own mtime predates the freshest entry in the manifest, otherwise the
//! bytes on disk are returned verbatim.

use std::io::Cursor;
use std::path::Path;
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::ExplorerError;
use grove::Manifest;

fn rfc2822(secs: u64) -> String {
    DateTime::from_timestamp(secs as i64, 0)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .to_rfc2822()
}

fn text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> Result<(), ExplorerError> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn render(
    manifest: &Manifest,
    self_url: &str,
    config: &Config,
    last_build: u64,
) -> Result<Vec<u8>, ExplorerError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    writer
        .create_element("rss")
        .with_attribute(("version", "2.0"))
        .with_attribute(("xmlns:atom", "http://www.w3.org/2005/Atom"))
        .write_inner_content(|rss| {
            rss.create_element("channel").write_inner_content(|channel| {
                text_element(channel, "title", &config.title).map_err(io_shim)?;
                text_element(channel, "description", &config.description).map_err(io_shim)?;
                text_element(channel, "link", self_url).map_err(io_shim)?;
                channel
                    .create_element("atom:link")
                    .with_attribute(("href", format!("{self_url}?feed").as_str()))
                    .with_attribute(("rel", "self"))
                    .with_attribute(("type", "application/rss+xml"))
                    .write_empty()?;
                text_element(channel, "pubDate", &rfc2822(now_secs())).map_err(io_shim)?;
                text_element(channel, "lastBuildDate", &rfc2822(last_build)).map_err(io_shim)?;

                channel.create_element("item").write_inner_content(|item| {
                    text_element(item, "title", &format!("{} got an update", config.title))
                        .map_err(io_shim)?;
                    text_element(
                        item,
                        "description",
                        &format!(
                            "{} has been updated! Check this out: {self_url}",
                            config.title
                        ),
                    )
                    .map_err(io_shim)?;
                    text_element(item, "pubDate", &rfc2822(manifest.freshest_modified))
                        .map_err(io_shim)?;
                    text_element(item, "link", self_url).map_err(io_shim)?;
                    item.create_element("guid")
                        .with_attribute(("isPermaLink", "true"))
                        .write_text_content(BytesText::new(self_url))?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })?;

    Ok(writer.into_inner().into_inner())
}

// write_inner_content closures must return io::Error.
fn io_shim(e: ExplorerError) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Return the feed bytes for `manifest`, rewriting `feed_path` first if the
/// file is missing or older than the freshest indexed entry.
pub fn feed_bytes(
    manifest: &Manifest,
    feed_path: &Path,
    self_url: &str,
    config: &Config,
) -> Result<Vec<u8>, ExplorerError> {
    let previous = std::fs::metadata(feed_path)
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs());

    if let Some(prev) = previous {
        if prev >= manifest.freshest_modified {
            debug!(feed = %feed_path.display(), "Feed still fresh, serving cached bytes");
            return Ok(std::fs::read(feed_path)?);
        }
    }

    let bytes = render(manifest, self_url, config, previous.unwrap_or_else(now_secs))?;
    std::fs::write(feed_path, &bytes)?;
    info!(feed = %feed_path.display(), bytes = bytes.len(), "Feed rebuilt");
    Ok(bytes)
}
