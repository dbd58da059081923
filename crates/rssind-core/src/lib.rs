pub mod config;
pub mod error;
pub mod feed;
pub mod repository;
pub mod scheduler;
pub mod storage;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use feed::{Entry, FeedSource, HttpFeedSource};
pub use repository::{Feed, FeedRepository, ImportSummary};
pub use scheduler::PollScheduler;
