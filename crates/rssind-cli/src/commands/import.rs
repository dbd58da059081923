use std::path::Path;

use anyhow::Result;

use crate::opml::read_opml_file;
use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository, file_path: &Path) -> Result<()> {
    let feeds = read_opml_file(file_path)?;
    println!("Found {} feeds in OPML file\n", feeds.len());

    if feeds.is_empty() {
        return Ok(());
    }

    let pairs = feeds.into_iter().map(|feed| (feed.url, feed.name));
    let summary = repo.import_feeds(pairs).await?;

    for (url, reason) in &summary.failed {
        println!("  failed: {} ({})", url, reason);
    }

    println!("\nImport complete:");
    println!("  Imported: {}", summary.added.len());
    println!("  Skipped (already subscribed): {}", summary.skipped.len());
    println!("  Failed: {}", summary.failed.len());

    Ok(())
}
