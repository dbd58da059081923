use anyhow::Result;
use chrono::{DateTime, Utc};

use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository) -> Result<()> {
    let feeds = repo.feeds().await;

    if feeds.is_empty() {
        println!("No subscriptions yet.");
        println!("\nTo subscribe to a feed, run:");
        println!("  rssind subscribe <url> [-n <name>]");
        return Ok(());
    }

    println!("Subscriptions ({}):\n", feeds.len());

    for feed in &feeds {
        let unread = feed.unread_count().await?;
        let unread = if unread > 0 {
            format!(" ({} unread)", unread)
        } else {
            String::new()
        };

        let error = match feed.fetch_error().await {
            Some(err) => format!(" [ERROR: {}]", err),
            None => String::new(),
        };

        println!("  {}{}{}", feed.name(), unread, error);
        println!("    URL: {}", feed.url());

        let last_read = feed.last_read().await;
        if last_read > DateTime::<Utc>::UNIX_EPOCH {
            println!("    Last read: {}", last_read.format("%Y-%m-%d %H:%M"));
        }
        println!();
    }

    Ok(())
}
