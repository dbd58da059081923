use async_trait::async_trait;

use super::models::FetchedFeed;
use crate::Result;

/// Anything that can turn a feed URL into a parsed list of raw entries.
///
/// Network and parse failures are reported as fetch-kind errors
/// (see [`crate::Error::is_fetch`]).
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed>;
}
