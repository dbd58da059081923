use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{error, info};

use super::print_changed;
use rssind_core::{Feed, FeedRepository, PollScheduler};

pub async fn run(repo: Arc<FeedRepository>, interval_mins: u32) -> Result<()> {
    // The callback runs on the scheduler task; hand results over to this one
    let (tx, rx) = mpsc::unbounded_channel();
    let scheduler = PollScheduler::start(repo, interval_mins, move |changed| {
        let _ = tx.send(changed);
    })?;

    println!(
        "Checking feeds every {} minutes. Press Ctrl+C to stop.",
        interval_mins
    );

    let outcome = relay(rx, tokio::signal::ctrl_c(), |changed: Vec<Arc<Feed>>| async move {
        print_changed(&changed).await
    })
    .await;

    scheduler.stop().await?;
    println!("Stopped.");

    outcome
}

/// Report every batch received on `rx` until `shutdown` resolves or a report
/// fails. Always returns so the caller can stop the scheduler.
async fn relay<T, S, R, Fut>(
    mut rx: mpsc::UnboundedReceiver<T>,
    shutdown: S,
    mut report: R,
) -> Result<()>
where
    S: Future,
    R: FnMut(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Received shutdown signal");
                return Ok(());
            }
            Some(batch) = rx.recv() => {
                if let Err(e) = report(batch).await {
                    error!("Failed to report changed feeds: {}", e);
                    return Err(e);
                }
            }
        }
    }
}
