use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted metadata of a subscribed feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedInfo {
    pub url: String,
    pub name: String,
    /// Entries published at or before this instant count as seen
    pub last_read: DateTime<Utc>,
}

/// A stored feed entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Dedup key, unique within its feed
    pub id: String,
    pub feed_url: String,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub pub_date: DateTime<Utc>,
}

/// An entry as reported by a feed source, before keys and dates are settled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub id: Option<String>,
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

/// Result of fetching one feed document
#[derive(Debug, Clone, Default)]
pub struct FetchedFeed {
    pub title: Option<String>,
    pub entries: Vec<RawEntry>,
}

impl RawEntry {
    /// The key an entry is deduplicated by: its own id, else its title, else
    /// its link. `None` when the entry carries none of them.
    pub fn dedup_key(&self) -> Option<&str> {
        [self.id.as_deref(), Some(self.title.as_str()), Some(self.link.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|key| !key.is_empty())
    }
}
