use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tokio::sync::Mutex;

use crate::feed::{Entry, FeedInfo, FeedSource, RawEntry};
use crate::storage::{is_storable, EntryStore};
use crate::{Error, Result};

/// Handles a feed record shares with the repository that owns it
#[derive(Clone)]
pub(crate) struct Backend {
    pub(crate) store: EntryStore,
    pub(crate) source: Arc<dyn FeedSource>,
}

impl Backend {
    /// Fetch `url` and merge its entries into the store. Never touches the
    /// read watermark. Returns how many entries were new to the store.
    pub(crate) async fn update_feed_entries(&self, url: &str) -> Result<u32> {
        let fetched = self.source.fetch(url).await.map_err(|e| match e {
            e @ Error::Fetch { .. } => e,
            other => Error::fetch(url, other),
        })?;

        // Stand-in publish date for entries that carry none or an unusable one
        let captured = Utc::now().trunc_subsecs(6);

        let total = fetched.entries.len();
        let entries: Vec<Entry> = fetched
            .entries
            .into_iter()
            .filter_map(|raw| to_entry(url, raw, captured))
            .collect();

        if entries.len() < total {
            tracing::debug!(
                feed = url,
                skipped = total - entries.len(),
                "Skipped entries without id, title or link"
            );
        }

        self.store.insert_entries(url, &entries).await
    }
}

fn to_entry(feed_url: &str, raw: RawEntry, captured: DateTime<Utc>) -> Option<Entry> {
    let id = raw.dedup_key()?.to_string();

    Some(Entry {
        id,
        feed_url: feed_url.to_string(),
        pub_date: raw.published.filter(is_storable).unwrap_or(captured),
        title: raw.title,
        link: raw.link,
        description: raw.description,
    })
}

/// A subscribed feed and its read watermark
pub struct Feed {
    url: String,
    name: String,
    last_read: Mutex<DateTime<Utc>>,
    fetch_error: Mutex<Option<String>>,
    backend: Backend,
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed")
            .field("url", &self.url)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Feed {
    pub(crate) fn new(info: FeedInfo, backend: Backend) -> Self {
        Self {
            url: info.url,
            name: info.name,
            last_read: Mutex::new(info.last_read),
            fetch_error: Mutex::new(None),
            backend,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn last_read(&self) -> DateTime<Utc> {
        *self.last_read.lock().await
    }

    pub async fn info(&self) -> FeedInfo {
        FeedInfo {
            url: self.url.clone(),
            name: self.name.clone(),
            last_read: self.last_read().await,
        }
    }

    /// Message of the last failed update, cleared by the next successful one
    pub async fn fetch_error(&self) -> Option<String> {
        self.fetch_error.lock().await.clone()
    }

    /// Fetch fresh entries over the network and merge them into the store
    pub async fn update(&self) -> Result<u32> {
        let result = self.backend.update_feed_entries(&self.url).await;

        match &result {
            Ok(_) => *self.fetch_error.lock().await = None,
            Err(e) if e.is_fetch() => *self.fetch_error.lock().await = Some(e.to_string()),
            Err(_) => {}
        }

        result
    }

    /// Entries published after the watermark, oldest first
    pub async fn get_new_entries(&self) -> Result<Vec<Entry>> {
        let since = self.last_read().await;
        self.backend.store.query_entries(&self.url, Some(since)).await
    }

    /// Every stored entry of this feed, oldest first
    pub async fn all_entries(&self) -> Result<Vec<Entry>> {
        self.backend.store.query_entries(&self.url, None).await
    }

    pub async fn unread_count(&self) -> Result<u32> {
        let since = self.last_read().await;
        self.backend.store.count_entries_since(&self.url, since).await
    }

    /// Move the watermark to `timestamp`, or to now when `None`, and persist
    /// it. Without an explicit timestamp the watermark never moves backwards.
    pub async fn set_read_date(&self, timestamp: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
        let mut last_read = self.last_read.lock().await;

        let next = match timestamp {
            Some(ts) if !is_storable(&ts) => {
                return Err(Error::InvalidTimestamp(ts.to_rfc3339()));
            }
            Some(ts) => ts.trunc_subsecs(6),
            None => Utc::now().trunc_subsecs(6).max(*last_read),
        };

        self.backend
            .store
            .upsert_feed(&FeedInfo {
                url: self.url.clone(),
                name: self.name.clone(),
                last_read: next,
            })
            .await?;

        *last_read = next;
        tracing::debug!(feed = %self.url, last_read = %next, "Watermark moved");

        Ok(next)
    }
}
