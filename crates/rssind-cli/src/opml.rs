use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// A subscription listed in an OPML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpmlFeed {
    pub url: String,
    pub name: String,
}

pub fn read_opml_file(path: &Path) -> Result<Vec<OpmlFeed>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_opml(&content)
}

/// Collect the RSS outlines of an OPML document. Outlines without an
/// `xmlUrl`, or whose `type` is not `rss`, are ignored.
pub fn parse_opml(content: &str) -> Result<Vec<OpmlFeed>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut feeds = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"outline" => {
                if let Some(feed) = rss_outline(&e) {
                    feeds.push(feed);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(e).context("Failed to parse OPML");
            }
            _ => {}
        }
    }

    Ok(feeds)
}

fn rss_outline(outline: &BytesStart) -> Option<OpmlFeed> {
    let mut xml_url = None;
    let mut title = None;
    let mut text = None;
    let mut is_rss = false;

    for attr in outline.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value).to_string();
        match attr.key.as_ref() {
            b"xmlUrl" => xml_url = Some(value),
            b"title" => title = Some(value),
            b"text" => text = Some(value),
            b"type" => is_rss = value.eq_ignore_ascii_case("rss"),
            _ => {}
        }
    }

    if !is_rss {
        return None;
    }

    Some(OpmlFeed {
        url: xml_url?,
        name: title.or(text).unwrap_or_default(),
    })
}
