use anyhow::Result;

use super::{find_feed, print_entry};
use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository, url: &str, all: bool) -> Result<()> {
    let feed = find_feed(repo, url).await?;

    let entries = if all {
        feed.all_entries().await?
    } else {
        feed.get_new_entries().await?
    };

    if entries.is_empty() {
        println!("No {}entries for '{}'.", if all { "" } else { "new " }, feed.name());
        return Ok(());
    }

    println!("{} ({} entries)", feed.name(), entries.len());
    for entry in &entries {
        print_entry(entry);
    }

    Ok(())
}
