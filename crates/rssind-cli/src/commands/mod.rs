pub mod check;
pub mod entries;
pub mod import;
pub mod list;
pub mod mark_read;
pub mod subscribe;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;

use rssind_core::{Entry, Error, Feed, FeedRepository};

/// Look up a subscribed feed by URL
pub async fn find_feed(repo: &FeedRepository, url: &str) -> Result<Arc<Feed>> {
    repo.find(url)
        .await
        .ok_or_else(|| Error::FeedNotFound(url.to_string()).into())
}

pub fn print_entry(entry: &Entry) {
    println!(
        "  {}  {}",
        entry.pub_date.format("%Y-%m-%d %H:%M"),
        entry.title
    );
    if !entry.link.is_empty() {
        println!("    {}", entry.link);
    }
}

/// Print every changed feed with its unread entries
pub async fn print_changed(feeds: &[Arc<Feed>]) -> Result<()> {
    if feeds.is_empty() {
        println!("No new entries.");
        return Ok(());
    }

    for feed in feeds {
        let entries = feed.get_new_entries().await?;
        println!("{} ({} new)", feed.name(), entries.len());
        for entry in &entries {
            print_entry(entry);
        }
        println!();
    }

    Ok(())
}
