use feed_rs::parser;

use super::models::{FetchedFeed, RawEntry};
use crate::{Error, Result};

/// Parse RSS/Atom content into a feed title and raw entries
pub fn parse_feed(content: &[u8]) -> Result<FetchedFeed> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed
        .title
        .map(|t| t.content.trim().to_string())
        .filter(|t| !t.is_empty());

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let id = Some(entry.id).filter(|id| !id.trim().is_empty());

            let title = entry.title.map(|t| t.content).unwrap_or_default();

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body));

            // Atom feeds often carry only <updated>
            let published = entry.published.or(entry.updated);

            RawEntry {
                id,
                title,
                link,
                description,
                published,
            }
        })
        .collect();

    Ok(FetchedFeed { title, entries })
}
