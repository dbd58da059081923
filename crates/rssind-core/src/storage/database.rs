use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::Duration;

use crate::config::AppConfig;
use crate::{Error, Result};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open the database at the configured location
    pub async fn new(config: &AppConfig) -> Result<Self> {
        Self::open(&config.database_path()).await
    }

    /// Open (or create) the database file at `db_path`, creating the schema
    /// on first run
    pub async fn open(db_path: &Path) -> Result<Self> {
        // Ensure the data directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!("Connecting to database: {}", db_path.display());

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.bootstrap().await?;

        Ok(db)
    }

    /// Create an in-memory database for testing
    #[cfg(test)]
    pub async fn new_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let db = Self { pool };
        db.bootstrap().await?;

        Ok(db)
    }

    /// Create the schema unless it is already there.
    ///
    /// A store that cannot even be probed is reported as a storage error and
    /// left untouched; only a readable store without tables is initialised.
    async fn bootstrap(&self) -> Result<()> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'feeds'",
        )
        .fetch_optional(&self.pool)
        .await?;

        if existing.is_some() {
            tracing::debug!("Database schema present");
            return Ok(());
        }

        tracing::info!("Creating database schema");
        self.create_schema().await.map_err(Error::SchemaBootstrap)
    }

    async fn create_schema(&self) -> std::result::Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for statement in SCHEMA {
            sqlx::query(statement).execute(&mut *tx).await?;
        }

        tx.commit().await
    }

    /// Get the connection pool
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Wait for pooled connections to finish and close them
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

const SCHEMA: [&str; 3] = [SCHEMA_FEEDS, SCHEMA_ENTRIES, SCHEMA_INDEXES];

const SCHEMA_FEEDS: &str = r#"
CREATE TABLE feeds (
    url TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    last_read TEXT NOT NULL
)
"#;

// Entry ids are only unique per feed, so the key is namespaced by feed_url.
const SCHEMA_ENTRIES: &str = r#"
CREATE TABLE entries (
    id TEXT NOT NULL,
    feed_url TEXT NOT NULL REFERENCES feeds(url) ON DELETE CASCADE,
    title TEXT NOT NULL,
    link TEXT NOT NULL,
    description TEXT,
    pub_date TEXT NOT NULL,
    PRIMARY KEY (feed_url, id)
)
"#;

const SCHEMA_INDEXES: &str = r#"
CREATE INDEX idx_entries_pub_date ON entries(pub_date)
"#;

#[cfg(test)]
mod tests {
    use super::*;

    async fn table_names(db: &Database) -> Vec<String> {
        sqlx::query_scalar(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_in_memory_schema_created() {
        let db = Database::new_in_memory().await.unwrap();
        assert_eq!(table_names(&db).await, vec!["entries", "feeds"]);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        db.bootstrap().await.unwrap();
        assert_eq!(table_names(&db).await, vec!["entries", "feeds"]);
    }

    #[tokio::test]
    async fn test_open_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("rssind.db");

        let db = Database::open(&path).await.unwrap();
        assert!(path.exists());
        assert_eq!(table_names(&db).await, vec!["entries", "feeds"]);
        db.close().await;
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rssind.db");
        std::fs::write(&path, vec![0xAB; 8192]).unwrap();

        let result = Database::open(&path).await;
        assert!(matches!(result, Err(Error::Storage(_))));
    }
}
