use crate::rss_utils::text::truncate_chars;
use crate::traits::FeedSource;
use crate::types::{CasterError, FetchConfig, Result};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{header, Client};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Fetch every URL concurrently, preserving input order.
///
/// The first failure fails the whole batch; bodies of fetches that were
/// still in flight are discarded.
pub async fn fetch_all<S: AsRef<str>>(source: &dyn FeedSource, urls: &[S]) -> Result<Vec<String>> {
    try_join_all(urls.iter().map(|url| source.fetch(url.as_ref()))).await
}

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> CasterError {
        if e.is_timeout() {
            CasterError::Timeout { url: url.to_string() }
        } else {
            CasterError::Http(e)
        }
    }

    fn check_size(&self, url: &str, bytes: usize) -> Result<()> {
        let size_mb = bytes / (1024 * 1024);
        if size_mb > self.config.max_feed_size_mb {
            return Err(CasterError::FeedTooLarge {
                url: url.to_string(),
                size_mb,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FeedSource for Fetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let response = self
            .client
            .get(url)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body = if body.is_empty() {
                status.canonical_reason().unwrap_or("Unknown").to_string()
            } else {
                truncate_chars(&body, self.config.error_body_chars).to_string()
            };
            warn!("Feed {} returned HTTP {}", url, status.as_u16());
            return Err(CasterError::FetchFailed {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        if let Some(content_length) = response.content_length() {
            self.check_size(url, content_length as usize)?;
        }

        let content = response.text().await.map_err(|e| self.map_send_error(url, e))?;
        self.check_size(url, content.len())?;

        info!("Fetched feed: {} ({} bytes in {:?})", url, content.len(), start_time.elapsed());
        Ok(content)
    }
}
