mod feed;
mod feed_repo;

pub use feed::Feed;
pub use feed_repo::{FeedRepository, ImportSummary};
