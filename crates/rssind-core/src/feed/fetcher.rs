use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use super::models::FetchedFeed;
use super::parser::parse_feed;
use super::source::FeedSource;
use crate::config::SyncConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;
const FEED_USER_AGENT: &str = concat!("rssind/", env!("CARGO_PKG_VERSION"));

/// Feed source backed by HTTP and feed-rs
pub struct HttpFeedSource {
    client: Client,
}

impl HttpFeedSource {
    /// Create a new fetcher with configuration
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(Self::default_headers())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = config.proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(FEED_USER_AGENT));
        headers
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::fetch(url, format!("HTTP {}", status)));
        }

        let content = response.bytes().await.map_err(|e| Error::fetch(url, e))?;

        if content.len() > MAX_FEED_BYTES {
            return Err(Error::fetch(
                url,
                format!("feed too large ({} bytes)", content.len()),
            ));
        }

        Ok(content)
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        Url::parse(url)?;

        tracing::debug!("Fetching feed from: {}", url);

        let content = self.fetch_bytes(url).await?;
        parse_feed(&content).map_err(|e| Error::fetch(url, e))
    }
}
