//! Scripted feed source and fixtures shared by the unit tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::feed::{FeedSource, FetchedFeed, RawEntry};
use crate::repository::FeedRepository;
use crate::storage::{Database, EntryStore};
use crate::{Error, Result};

/// Serves canned responses per URL; unknown URLs fail like a 404
#[derive(Default)]
pub(crate) struct ScriptedSource {
    responses: Mutex<HashMap<String, std::result::Result<FetchedFeed, String>>>,
    delay: Mutex<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn serve(&self, url: &str, title: Option<&str>, entries: Vec<RawEntry>) {
        let feed = FetchedFeed {
            title: title.map(str::to_string),
            entries,
        };
        self.responses.lock().unwrap().insert(url.to_string(), Ok(feed));
    }

    pub(crate) fn fail(&self, url: &str, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(reason.to_string()));
    }

    /// Make every fetch take at least `delay`
    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of fetches observed running at once
    pub(crate) fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for ScriptedSource {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let response = self.responses.lock().unwrap().get(url).cloned();
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            Some(Ok(feed)) => Ok(feed),
            Some(Err(reason)) => Err(Error::fetch(url, reason)),
            None => Err(Error::fetch(url, "HTTP 404 Not Found")),
        }
    }
}

pub(crate) async fn test_repository(source: Arc<ScriptedSource>) -> Arc<FeedRepository> {
    test_repository_with_db(source).await.0
}

/// Like [`test_repository`], also handing back the database so a test can
/// close it underneath the repository
pub(crate) async fn test_repository_with_db(
    source: Arc<ScriptedSource>,
) -> (Arc<FeedRepository>, Database) {
    let db = Database::new_in_memory().await.unwrap();
    let store = EntryStore::new(db.clone());
    let repo = Arc::new(FeedRepository::open(store, source).await.unwrap());
    (repo, db)
}

pub(crate) fn raw(id: Option<&str>, title: &str, published: Option<DateTime<Utc>>) -> RawEntry {
    RawEntry {
        id: id.map(str::to_string),
        title: title.to_string(),
        link: format!("https://example.com/{}", title.to_lowercase().replace(' ', "-")),
        description: None,
        published,
    }
}

pub(crate) fn hours_ago(hours: i64) -> DateTime<Utc> {
    Utc::now() - chrono::Duration::hours(hours)
}
