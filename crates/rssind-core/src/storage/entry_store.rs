use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use sqlx::FromRow;

use super::Database;
use crate::feed::{Entry, FeedInfo};
use crate::{Error, Result};

/// Durable table of feeds and their deduplicated entries
#[derive(Clone)]
pub struct EntryStore {
    db: Database,
}

#[derive(FromRow)]
struct FeedRow {
    url: String,
    name: String,
    last_read: String,
}

impl TryFrom<FeedRow> for FeedInfo {
    type Error = Error;

    fn try_from(row: FeedRow) -> Result<Self> {
        Ok(FeedInfo {
            last_read: decode_timestamp(&row.last_read)?,
            url: row.url,
            name: row.name,
        })
    }
}

#[derive(FromRow)]
struct EntryRow {
    id: String,
    feed_url: String,
    title: String,
    link: String,
    description: Option<String>,
    pub_date: String,
}

impl TryFrom<EntryRow> for Entry {
    type Error = Error;

    fn try_from(row: EntryRow) -> Result<Self> {
        Ok(Entry {
            pub_date: decode_timestamp(&row.pub_date)?,
            id: row.id,
            feed_url: row.feed_url,
            title: row.title,
            link: row.link,
            description: row.description,
        })
    }
}

/// Fixed-width UTC text, so that string order in SQLite is time order
pub(crate) fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Whether `ts` survives [`encode_timestamp`] with its ordering intact.
/// Years outside 0000..=9999 gain a sign or a fifth digit.
pub(crate) fn is_storable(ts: &DateTime<Utc>) -> bool {
    (0..=9999).contains(&ts.year())
}

fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| Error::InvalidTimestamp(raw.to_string()))
}

impl EntryStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store `entries` under `feed_url`, skipping any whose id the feed
    /// already holds. The batch is applied atomically; returns the number of
    /// rows actually added.
    pub async fn insert_entries(&self, feed_url: &str, entries: &[Entry]) -> Result<u32> {
        let mut tx = self.db.pool().begin().await?;
        let mut inserted = 0;

        for entry in entries {
            let result = sqlx::query(
                r#"
                INSERT OR IGNORE INTO entries (id, feed_url, title, link, description, pub_date)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&entry.id)
            .bind(feed_url)
            .bind(&entry.title)
            .bind(&entry.link)
            .bind(&entry.description)
            .bind(encode_timestamp(&entry.pub_date))
            .execute(&mut *tx)
            .await?;

            inserted += result.rows_affected() as u32;
        }

        tx.commit().await?;

        Ok(inserted)
    }

    /// Entries of a feed, oldest first. With `since`, only entries published
    /// strictly after it.
    pub async fn query_entries(
        &self,
        feed_url: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Entry>> {
        let rows: Vec<EntryRow> = match since {
            Some(since) => {
                sqlx::query_as(
                    r#"
                    SELECT id, feed_url, title, link, description, pub_date
                    FROM entries
                    WHERE feed_url = ? AND pub_date > ?
                    ORDER BY pub_date ASC, rowid ASC
                    "#,
                )
                .bind(feed_url)
                .bind(encode_timestamp(&since))
                .fetch_all(self.db.pool())
                .await?
            }
            None => {
                sqlx::query_as(
                    r#"
                    SELECT id, feed_url, title, link, description, pub_date
                    FROM entries
                    WHERE feed_url = ?
                    ORDER BY pub_date ASC, rowid ASC
                    "#,
                )
                .bind(feed_url)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        rows.into_iter().map(Entry::try_from).collect()
    }

    /// Number of entries of a feed published strictly after `since`
    pub async fn count_entries_since(&self, feed_url: &str, since: DateTime<Utc>) -> Result<u32> {
        let count: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM entries WHERE feed_url = ? AND pub_date > ?")
                .bind(feed_url)
                .bind(encode_timestamp(&since))
                .fetch_one(self.db.pool())
                .await?;

        Ok(count.0 as u32)
    }

    /// Insert the feed or replace all of its metadata. The existing row is
    /// updated in place so its entries are kept.
    pub async fn upsert_feed(&self, feed: &FeedInfo) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO feeds (url, name, last_read)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO UPDATE
            SET name = excluded.name,
                last_read = excluded.last_read
            "#,
        )
        .bind(&feed.url)
        .bind(&feed.name)
        .bind(encode_timestamp(&feed.last_read))
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    /// Every persisted feed, in subscription order
    pub async fn load_all_feeds(&self) -> Result<Vec<FeedInfo>> {
        let rows: Vec<FeedRow> =
            sqlx::query_as("SELECT url, name, last_read FROM feeds ORDER BY rowid ASC")
                .fetch_all(self.db.pool())
                .await?;

        rows.into_iter().map(FeedInfo::try_from).collect()
    }
}
