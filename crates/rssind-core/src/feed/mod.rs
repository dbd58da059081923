mod fetcher;
mod models;
mod parser;
mod source;

pub use fetcher::HttpFeedSource;
pub use models::{Entry, FeedInfo, FetchedFeed, RawEntry};
pub use parser::parse_feed;
pub use source::FeedSource;
