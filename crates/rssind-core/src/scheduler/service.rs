use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use crate::repository::{Feed, FeedRepository};
use crate::{Error, Result};

/// Runs `check_feeds` on a fixed interval in its own task.
///
/// Cycles never overlap: the next tick is only awaited once the previous
/// cycle has finished, and ticks missed meanwhile are dropped. The callback
/// runs on the scheduler task with the feeds that have unseen entries, once
/// per completed cycle, even when that list is empty.
pub struct PollScheduler {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl PollScheduler {
    /// Start polling every `interval_mins` minutes. The first check happens
    /// one interval after start.
    pub fn start<F>(repo: Arc<FeedRepository>, interval_mins: u32, on_tick: F) -> Result<Self>
    where
        F: Fn(Vec<Arc<Feed>>) + Send + 'static,
    {
        if interval_mins == 0 {
            return Err(Error::Config(
                "check interval must be at least one minute".to_string(),
            ));
        }

        let period = Duration::from_secs(u64::from(interval_mins) * 60);
        Ok(Self::spawn(repo, period, on_tick))
    }

    pub(crate) fn spawn<F>(repo: Arc<FeedRepository>, period: Duration, on_tick: F) -> Self
    where
        F: Fn(Vec<Arc<Feed>>) + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(run(repo, period, on_tick, shutdown_rx));

        Self { shutdown_tx, join }
    }

    pub fn is_running(&self) -> bool {
        !self.join.is_finished()
    }

    /// Stop scheduling new cycles and wait for the one in flight, if any
    pub async fn stop(self) -> Result<()> {
        // Err only means the task is already gone
        let _ = self.shutdown_tx.send(true);
        self.join.await?;
        Ok(())
    }
}

async fn run<F>(
    repo: Arc<FeedRepository>,
    period: Duration,
    on_tick: F,
    mut shutdown: watch::Receiver<bool>,
) where
    F: Fn(Vec<Arc<Feed>>) + Send + 'static,
{
    info!("Poll scheduler started: every {}s", period.as_secs());

    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;

            result = shutdown.changed() => {
                if result.is_err() || *shutdown.borrow() {
                    info!("Poll scheduler received shutdown signal");
                    break;
                }
            }

            _ = interval.tick() => {
                debug!("Running scheduled feed check");
                match repo.check_feeds().await {
                    Ok(changed) => {
                        if !changed.is_empty() {
                            info!("Scheduled check: {} feeds with new entries", changed.len());
                        }
                        on_tick(changed);
                    }
                    Err(e) => {
                        error!("Scheduled feed check failed: {}", e);
                    }
                }
            }
        }
    }

    info!("Poll scheduler stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{hours_ago, raw, test_repository, test_repository_with_db, ScriptedSource};
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    const URL: &str = "https://example.com/rss";
    const WAIT: Duration = Duration::from_secs(5);

    fn forward(tx: mpsc::UnboundedSender<Vec<String>>) -> impl Fn(Vec<Arc<Feed>>) + Send + 'static {
        move |feeds| {
            let urls = feeds.iter().map(|f| f.url().to_string()).collect();
            let _ = tx.send(urls);
        }
    }

    #[tokio::test]
    async fn test_zero_interval_rejected() {
        let repo = test_repository(ScriptedSource::new()).await;
        let result = PollScheduler::start(repo, 0, |_| {});
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_callback_receives_changed_feeds() {
        let source = ScriptedSource::new();
        source.serve(URL, None, vec![raw(Some("1"), "Hello", Some(hours_ago(1)))]);
        source.serve("https://quiet.example/rss", None, vec![]);
        let repo = test_repository(source).await;
        repo.add_by_url(URL, Some("Example")).await.unwrap();
        repo.add_by_url("https://quiet.example/rss", Some("Quiet"))
            .await
            .unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = PollScheduler::spawn(repo, Duration::from_millis(20), forward(tx));

        let changed = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(changed, vec![URL.to_string()]);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_callback_runs_when_nothing_changed() {
        let source = ScriptedSource::new();
        source.serve(URL, None, vec![]);
        let repo = test_repository(source).await;
        repo.add_by_url(URL, Some("Example")).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = PollScheduler::spawn(repo, Duration::from_millis(20), forward(tx));

        let changed = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert!(changed.is_empty());

        scheduler.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_cycles_never_overlap() {
        let source = ScriptedSource::new();
        source.serve(URL, None, vec![]);
        source.set_delay(Duration::from_millis(60));
        let repo = test_repository(source.clone()).await;
        repo.add_by_url(URL, Some("Example")).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = PollScheduler::spawn(repo, Duration::from_millis(10), forward(tx));

        for _ in 0..3 {
            timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        }
        scheduler.stop().await.unwrap();

        assert_eq!(source.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_stop_lets_in_flight_cycle_finish() {
        let source = ScriptedSource::new();
        source.serve(URL, None, vec![raw(Some("1"), "Hello", Some(hours_ago(1)))]);
        source.set_delay(Duration::from_millis(100));
        let repo = test_repository(source.clone()).await;
        let feed = repo.add_by_url(URL, Some("Example")).await.unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler =
            PollScheduler::spawn(repo.clone(), Duration::from_millis(10), forward(tx));

        // Wait until the first fetch has started
        timeout(WAIT, async {
            while source.calls() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        scheduler.stop().await.unwrap();

        assert_eq!(rx.recv().await, Some(vec![URL.to_string()]));
        assert_eq!(rx.recv().await, None);
        assert_eq!(source.calls(), 1);
        assert_eq!(feed.all_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_callback() {
        let source = ScriptedSource::new();
        source.serve(URL, None, vec![raw(Some("1"), "Hello", Some(hours_ago(1)))]);
        let (repo, db) = test_repository_with_db(source.clone()).await;
        repo.add_by_url(URL, Some("Example")).await.unwrap();
        db.close().await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = PollScheduler::spawn(repo, Duration::from_millis(10), forward(tx));

        // Let several cycles fail
        timeout(WAIT, async {
            while source.calls() < 3 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert!(rx.try_recv().is_err());
        assert!(scheduler.is_running());

        scheduler.stop().await.unwrap();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_stop_while_idle() {
        let repo = test_repository(ScriptedSource::new()).await;
        let scheduler = PollScheduler::spawn(repo, Duration::from_secs(3600), |_| {});
        assert!(scheduler.is_running());
        scheduler.stop().await.unwrap();
    }
}
