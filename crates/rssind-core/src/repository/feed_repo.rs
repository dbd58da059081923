use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use url::Url;

use super::feed::{Backend, Feed};
use crate::feed::{FeedInfo, FeedSource};
use crate::storage::EntryStore;
use crate::{Error, Result};

/// Outcome of a best-effort import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub added: Vec<String>,
    /// Already subscribed, left untouched
    pub skipped: Vec<String>,
    /// `(url, reason)` for every pair that could not be subscribed
    pub failed: Vec<(String, String)>,
}

/// Owns the subscribed feeds and orchestrates subscribe, import and check
pub struct FeedRepository {
    backend: Backend,
    feeds: RwLock<Vec<Arc<Feed>>>,
}

impl FeedRepository {
    /// Build the repository from every feed persisted in `store`
    pub async fn open(store: EntryStore, source: Arc<dyn FeedSource>) -> Result<Self> {
        let backend = Backend { store, source };

        let feeds: Vec<Arc<Feed>> = backend
            .store
            .load_all_feeds()
            .await?
            .into_iter()
            .map(|info| Arc::new(Feed::new(info, backend.clone())))
            .collect();

        tracing::info!("Loaded {} feeds", feeds.len());

        Ok(Self {
            backend,
            feeds: RwLock::new(feeds),
        })
    }

    pub fn store(&self) -> &EntryStore {
        &self.backend.store
    }

    /// Snapshot of the subscribed feeds in subscription order
    pub async fn feeds(&self) -> Vec<Arc<Feed>> {
        self.feeds.read().await.clone()
    }

    pub async fn find(&self, url: &str) -> Option<Arc<Feed>> {
        self.feeds
            .read()
            .await
            .iter()
            .find(|feed| feed.url() == url)
            .cloned()
    }

    /// Subscribe to `url`. Without a name, the feed is fetched once to read
    /// its declared title; if that fails nothing is stored.
    ///
    /// Subscribing to a URL twice returns the existing feed unchanged.
    pub async fn add_by_url(&self, url: &str, name: Option<&str>) -> Result<Arc<Feed>> {
        Url::parse(url).map_err(|e| subscribe_error(url, e))?;

        if let Some(existing) = self.find(url).await {
            tracing::debug!(feed = url, "Already subscribed");
            return Ok(existing);
        }

        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => {
                let fetched = self
                    .backend
                    .source
                    .fetch(url)
                    .await
                    .map_err(|e| subscribe_error(url, e))?;
                fetched.title.unwrap_or_else(|| url.to_string())
            }
        };

        let info = FeedInfo {
            url: url.to_string(),
            name,
            last_read: DateTime::<Utc>::UNIX_EPOCH,
        };

        let mut feeds = self.feeds.write().await;
        if let Some(existing) = feeds.iter().find(|feed| feed.url() == url) {
            return Ok(existing.clone());
        }

        self.backend.store.upsert_feed(&info).await?;

        tracing::info!(feed = url, name = %info.name, "Subscribed");

        let feed = Arc::new(Feed::new(info, self.backend.clone()));
        feeds.push(feed.clone());

        Ok(feed)
    }

    /// Subscribe to every `(url, name)` pair. A pair that fails is recorded
    /// and the rest are still processed; only storage failures abort.
    pub async fn import_feeds<I>(&self, pairs: I) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut summary = ImportSummary::default();

        for (url, name) in pairs {
            if self.find(&url).await.is_some() {
                summary.skipped.push(url);
                continue;
            }

            match self.add_by_url(&url, Some(&name)).await {
                Ok(_) => summary.added.push(url),
                Err(e @ Error::Subscribe { .. }) => {
                    tracing::warn!(feed = %url, error = %e, "Import skipped feed");
                    summary.failed.push((url, e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            added = summary.added.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            "Import finished"
        );

        Ok(summary)
    }

    /// Fetch and merge the entries of one feed
    pub async fn update_feed_entries(&self, feed: &Feed) -> Result<u32> {
        self.backend.update_feed_entries(feed.url()).await
    }

    /// Update every feed, then return those with at least one entry newer
    /// than their watermark. A feed whose fetch fails is logged and left out
    /// of this cycle; storage failures abort the cycle.
    pub async fn check_feeds(&self) -> Result<Vec<Arc<Feed>>> {
        let feeds = self.feeds().await;
        let mut changed = Vec::new();
        let mut failed = 0;

        for feed in &feeds {
            match feed.update().await {
                Ok(added) => {
                    tracing::debug!(feed = %feed.url(), added, "Feed updated");
                }
                Err(e) if e.is_fetch() => {
                    tracing::warn!(feed = %feed.url(), error = %e, "Failed to update feed");
                    failed += 1;
                    continue;
                }
                Err(e) => return Err(e),
            }

            if feed.unread_count().await? > 0 {
                changed.push(feed.clone());
            }
        }

        tracing::info!(
            checked = feeds.len(),
            changed = changed.len(),
            failed,
            "Feed check finished"
        );

        Ok(changed)
    }
}

fn subscribe_error(url: &str, cause: impl ToString) -> Error {
    Error::Subscribe {
        url: url.to_string(),
        reason: cause.to_string(),
    }
}
