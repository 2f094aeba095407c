use crate::cache::{CachedFeed, FeedCache};
use crate::pipeline::FeedPipeline;
use crate::types::{Result, ResultEnvelope};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What one display cycle hands to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedView {
    pub data: ResultEnvelope,
    /// The data is older than the cache expiry.
    pub stale: bool,
    pub from_cache: bool,
    /// Set when a refresh was attempted and failed, so cached data is shown instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_error: Option<String>,
}

impl FeedView {
    fn cached(cached: CachedFeed, refresh_error: Option<String>) -> Self {
        Self {
            data: cached.envelope,
            stale: cached.stale,
            from_cache: true,
            refresh_error,
        }
    }
}

/// Cache-aware front of the pipeline. Reads the cache once at the start of a
/// display cycle and writes it once at the end.
pub struct FeedManager {
    pipeline: Arc<FeedPipeline>,
    cache: FeedCache,
}

impl FeedManager {
    pub fn new(pipeline: Arc<FeedPipeline>, cache: FeedCache) -> Self {
        Self { pipeline, cache }
    }

    pub fn pipeline(&self) -> &FeedPipeline {
        &self.pipeline
    }

    pub async fn load(&self, urls: &[String], force_refresh: bool) -> Result<FeedView> {
        self.pipeline.validate_urls(urls)?;

        let cached = match self.cache.load(urls).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!("Feed cache read failed, processing without it: {}", e);
                None
            }
        };

        if let Some(hit) = &cached {
            if !hit.stale && !force_refresh {
                debug!("Serving {} feed(s) from cache", urls.len());
                return Ok(FeedView::cached(hit.clone(), None));
            }
        }

        let previous = match (urls.len(), &cached) {
            (1, Some(hit)) => Some(hit.envelope.merged_content.as_str()),
            _ => None,
        };

        match self.pipeline.process(urls, previous).await {
            Ok(envelope) => {
                if let Err(e) = self.cache.store(&envelope).await {
                    warn!("Failed to write feed cache: {}", e);
                }
                info!("Refreshed {} feed(s)", urls.len());
                Ok(FeedView {
                    data: envelope,
                    stale: false,
                    from_cache: false,
                    refresh_error: None,
                })
            }
            Err(e) => match cached {
                Some(hit) => {
                    warn!("Refresh failed, serving cached data: {}", e);
                    Ok(FeedView::cached(hit, Some(e.to_string())))
                }
                None => Err(e),
            },
        }
    }
}
