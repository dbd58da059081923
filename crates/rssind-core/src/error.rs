use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Failed to create database schema: {0}")]
    SchemaBootstrap(#[source] sqlx::Error),

    #[error("Failed to subscribe to {url}: {reason}")]
    Subscribe { url: String, reason: String },

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Wrap any error raised while talking to a feed source.
    pub fn fetch(url: &str, reason: impl ToString) -> Self {
        Error::Fetch {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error came from the network/parse side of a poll rather
    /// than from storage. Only these are isolated per feed during a cycle.
    pub fn is_fetch(&self) -> bool {
        matches!(
            self,
            Error::Fetch { .. } | Error::Http(_) | Error::FeedParse(_) | Error::UrlParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
