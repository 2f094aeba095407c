//! Time-expiring cache of processed feeds on top of a [`KeyValueStore`].

use crate::feed_id::cache_key;
use crate::traits::KeyValueStore;
use crate::types::{Result, ResultEnvelope};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Cached results older than this are refreshed before display.
pub const CACHE_EXPIRY: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFeed {
    pub envelope: ResultEnvelope,
    pub stale: bool,
}

pub struct FeedCache {
    store: Arc<dyn KeyValueStore>,
    expiry: Duration,
}

impl FeedCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            expiry: CACHE_EXPIRY,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = expiry;
        self
    }

    /// Cached envelope for a URL set, if any. Entries that no longer
    /// deserialize are dropped from the store.
    pub async fn load<S: AsRef<str>>(&self, urls: &[S]) -> Result<Option<CachedFeed>> {
        let key = cache_key(urls);

        let Some(raw) = self.store.get(&key).await? else {
            debug!("Cache miss for {}", key);
            return Ok(None);
        };

        let envelope: ResultEnvelope = match serde_json::from_str(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.store.remove(&key).await?;
                return Ok(None);
            }
        };

        let age_ms = self.store.now_ms().saturating_sub(envelope.timestamp);
        let stale = i128::from(age_ms) >= self.expiry.as_millis() as i128;
        debug!("Cache hit for {} (age {}ms, stale: {})", key, age_ms, stale);

        Ok(Some(CachedFeed { envelope, stale }))
    }

    pub async fn store(&self, envelope: &ResultEnvelope) -> Result<()> {
        let key = cache_key(&envelope.source_urls);
        let value = serde_json::to_string(envelope)?;
        self.store.set(&key, &value).await
    }
}
