use anyhow::Result;

use rssind_core::FeedRepository;

pub async fn run(repo: &FeedRepository, url: &str, name: Option<&str>) -> Result<()> {
    println!("Subscribing to feed: {}", url);

    if repo.find(url).await.is_some() {
        println!("Already subscribed to this feed.");
        return Ok(());
    }

    let feed = repo.add_by_url(url, name).await?;
    println!("Created subscription: {}", feed.name());
    println!("Entries will be fetched on the next check.");

    Ok(())
}
