use anyhow::Result;

use super::print_changed;
use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository) -> Result<()> {
    println!("Checking {} feeds...\n", repo.feeds().await.len());

    let changed = repo.check_feeds().await?;
    print_changed(&changed).await?;

    for feed in repo.feeds().await {
        if let Some(err) = feed.fetch_error().await {
            println!("Failed to update '{}': {}", feed.name(), err);
        }
    }

    Ok(())
}
