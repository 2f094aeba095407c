mod common;

use alert_caster::feed_id::cache_key;
use alert_caster::traits::KeyValueStore;
use alert_caster::types::*;
use alert_caster::{FeedCache, FeedManager, MemoryStore, PipelineBuilder};
use chrono::Utc;
use common::*;
use std::sync::Arc;
use std::time::Duration;

const HOUR_MS: i64 = 60 * 60 * 1000;

fn manager(source: StaticSource, summarizer: Arc<RecordingSummarizer>, store: Arc<FixedClockStore>) -> FeedManager {
    let pipeline = PipelineBuilder::new(Arc::new(source), summarizer).build();
    FeedManager::new(Arc::new(pipeline), FeedCache::new(store))
}

fn urls(list: &[&str]) -> Vec<String> {
    list.iter().map(|url| url.to_string()).collect()
}

#[tokio::test]
async fn test_fresh_cache_hit_skips_processing() -> Result<()> {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(Utc::now().timestamp_millis()));
    let summarizer = Arc::new(RecordingSummarizer::new());
    let manager = manager(StaticSource::standard(), summarizer.clone(), store.clone());

    let first = manager.load(&urls(&[FEED_A_URL]), false).await?;
    assert!(!first.from_cache);
    assert!(!first.stale);

    store.advance_ms(30 * 60 * 1000);
    let second = manager.load(&urls(&[FEED_A_URL]), false).await?;
    assert!(second.from_cache);
    assert!(!second.stale);
    assert_eq!(second.data, first.data);
    assert_eq!(summarizer.inputs().len(), 1);

    let forced = manager.load(&urls(&[FEED_A_URL]), true).await?;
    assert!(!forced.from_cache);
    assert_eq!(summarizer.inputs().len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_stale_single_feed_refresh_diffs_against_cached_snapshot() -> Result<()> {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(Utc::now().timestamp_millis()));
    let summarizer = Arc::new(RecordingSummarizer::new());
    let manager = manager(StaticSource::standard(), summarizer.clone(), store.clone());

    let first = manager.load(&urls(&[FEED_A_URL]), false).await?;

    store.advance_ms(HOUR_MS + 60_000);
    let refreshed = manager.load(&urls(&[FEED_A_URL]), false).await?;
    assert!(!refreshed.from_cache);
    assert_eq!(refreshed.data.summary, "changes");

    let inputs = summarizer.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[1].previous_feed.as_deref(), Some(first.data.merged_content.as_str()));

    Ok(())
}

#[tokio::test]
async fn test_multi_feed_cache_ignores_url_order() -> Result<()> {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(Utc::now().timestamp_millis()));
    let summarizer = Arc::new(RecordingSummarizer::new());
    let manager = manager(StaticSource::standard(), summarizer.clone(), store.clone());

    manager.load(&urls(&[FEED_A_URL, FEED_B_URL]), false).await?;
    let reordered = manager.load(&urls(&[FEED_B_URL, FEED_A_URL]), false).await?;
    assert!(reordered.from_cache);

    store.advance_ms(2 * HOUR_MS);
    let refreshed = manager.load(&urls(&[FEED_B_URL, FEED_A_URL]), false).await?;
    assert!(!refreshed.from_cache);

    // No diff for merged feeds, even with a cached snapshot.
    let inputs = summarizer.inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[1].previous_feed, None);

    Ok(())
}

#[tokio::test]
async fn test_failed_refresh_serves_stale_data() -> Result<()> {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(Utc::now().timestamp_millis()));
    let healthy = manager(StaticSource::standard(), Arc::new(RecordingSummarizer::new()), store.clone());
    let first = healthy.load(&urls(&[FEED_A_URL]), false).await?;

    store.advance_ms(HOUR_MS * 3);
    let offline = manager(StaticSource::new(), Arc::new(RecordingSummarizer::new()), store.clone());
    let view = offline.load(&urls(&[FEED_A_URL]), false).await?;

    assert!(view.from_cache);
    assert!(view.stale);
    assert_eq!(view.data, first.data);
    let refresh_error = view.refresh_error.as_ref().expect("refresh error reported");
    assert!(refresh_error.contains("503"));

    let json = serde_json::to_value(&view)?;
    assert_eq!(json["fromCache"], true);
    assert!(json["refreshError"].as_str().is_some());

    Ok(())
}

#[tokio::test]
async fn test_failure_without_cache_propagates() {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(Utc::now().timestamp_millis()));
    let manager = manager(StaticSource::new(), Arc::new(RecordingSummarizer::new()), store);

    let err = manager.load(&urls(&[FEED_A_URL]), false).await.unwrap_err();
    assert!(matches!(err, CasterError::FetchFailed { status: 503, .. }));
}

#[tokio::test]
async fn test_unreadable_entry_is_discarded() -> Result<()> {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let key = cache_key(&[FEED_A_URL]);
    store.set(&key, "{not json").await?;

    let cache = FeedCache::new(store.clone());
    assert_eq!(cache.load(&[FEED_A_URL]).await?, None);
    assert!(store.is_empty().await);

    Ok(())
}

#[tokio::test]
async fn test_cache_round_trip_and_expiry() -> Result<()> {
    init_tracing();

    let store = Arc::new(FixedClockStore::new(10 * HOUR_MS));
    let cache = FeedCache::new(store.clone()).with_expiry(Duration::from_secs(60));

    let envelope = ResultEnvelope {
        merged_content: "<feed/>".to_string(),
        summary: "s".to_string(),
        timestamp: 10 * HOUR_MS,
        source_urls: urls(&[FEED_B_URL, FEED_A_URL]),
    };
    cache.store(&envelope).await?;

    let hit = cache.load(&[FEED_A_URL, FEED_B_URL]).await?.expect("cached");
    assert_eq!(hit.envelope, envelope);
    assert!(!hit.stale);

    store.advance_ms(60_000);
    assert!(cache.load(&[FEED_A_URL, FEED_B_URL]).await?.expect("cached").stale);

    Ok(())
}
