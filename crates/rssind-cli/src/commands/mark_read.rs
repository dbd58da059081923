use anyhow::Result;
use chrono::{DateTime, Utc};

use super::find_feed;
use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository, url: &str, at: Option<DateTime<Utc>>) -> Result<()> {
    let feed = find_feed(repo, url).await?;
    let last_read = feed.set_read_date(at).await?;

    println!(
        "Marked '{}' as read up to {}",
        feed.name(),
        last_read.format("%Y-%m-%d %H:%M:%S")
    );

    Ok(())
}
