#![allow(dead_code)]

use alert_caster::traits::{FeedSource, KeyValueStore, SentimentClassifier, Summarizer};
use alert_caster::types::*;
use alert_caster::MemoryStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

pub const FEED_A_URL: &str = "https://alerts.example.com/feeds/a";
pub const FEED_B_URL: &str = "https://alerts.example.com/feeds/b";
pub const BROKEN_URL: &str = "https://alerts.example.com/feeds/broken";

pub const FEED_A: &str = r#"<?xml version="1.0" encoding="utf-8"?><feed xmlns="http://www.w3.org/2005/Atom"><id>tag:google.com,2005:reader/user/1/state/com.google/alerts/a</id><title>Google Alert - rust</title><entry><id>tag:a1</id><title type="html">Rust wins award</title><link href="https://www.google.com/url?rct=j&amp;sa=t&amp;url=https://news.example.com/a&amp;ct=ga&amp;cd=CAIyGjE&amp;usg=AOvVaw1"/><published>2024-05-01T10:00:00Z</published><updated>2024-05-01T10:00:00Z</updated><content type="html">A record year for the &lt;b&gt;Rust&lt;/b&gt; project</content></entry><entry><id>tag:a2</id><title type="html">FAIL classifier on this one</title><link href="https://www.google.com/url?rct=j&amp;sa=t&amp;url=https://blog.example.org/post&amp;ct=ga&amp;cd=CAIyGjE&amp;usg=AOvVaw2"/><updated>2024-05-01T11:00:00Z</updated><content type="html">Plain text</content></entry></feed>"#;

pub const FEED_B: &str = r#"<?xml version="1.0" encoding="utf-8"?><feed xmlns="http://www.w3.org/2005/Atom"><id>tag:b</id><title>Google Alert - tokio</title><entry><id>tag:b1</id><title type="html">Tokio release</title><link href="https://www.google.com/url?rct=j&amp;sa=t&amp;url=https://www.tokio.example.net/release&amp;ct=ga&amp;cd=CAIyGjE&amp;usg=AOvVaw3"/><updated>2024-05-02T09:00:00Z</updated><content type="html">New runtime version</content></entry></feed>"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Serves canned bodies; unknown URLs fail with a 503.
#[derive(Default)]
pub struct StaticSource {
    feeds: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, body: &str) -> Self {
        self.feeds.insert(url.to_string(), body.to_string());
        self
    }

    pub fn standard() -> Self {
        Self::new().with_feed(FEED_A_URL, FEED_A).with_feed(FEED_B_URL, FEED_B)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StaticSource {
    async fn fetch(&self, url: &str) -> Result<String> {
        self.requested.lock().unwrap().push(url.to_string());
        self.feeds.get(url).cloned().ok_or_else(|| CasterError::FetchFailed {
            url: url.to_string(),
            status: 503,
            body: "Service Unavailable".to_string(),
        })
    }
}

/// Keeps every input it was asked to summarize.
#[derive(Default)]
pub struct RecordingSummarizer {
    inputs: Mutex<Vec<SummarizeInput>>,
    fail: bool,
}

impl RecordingSummarizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn inputs(&self) -> Vec<SummarizeInput> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    fn adapter_name(&self) -> String {
        "recording".to_string()
    }

    async fn summarize(&self, input: SummarizeInput) -> Result<SummarizeOutput> {
        let diff = input.previous_feed.is_some();
        self.inputs.lock().unwrap().push(input);
        if self.fail {
            return Err(CasterError::Summarizer("model unavailable".to_string()));
        }
        Ok(SummarizeOutput {
            summary: if diff { "changes".to_string() } else { "overview".to_string() },
        })
    }
}

/// Positive for everything, except titles containing "FAIL" which error out.
pub struct ScriptedClassifier;

#[async_trait]
impl SentimentClassifier for ScriptedClassifier {
    fn adapter_name(&self) -> String {
        "scripted".to_string()
    }

    async fn classify(&self, input: SentimentInput) -> Result<SentimentOutput> {
        if input.title.contains("FAIL") {
            return Err(CasterError::Classifier("scripted failure".to_string()));
        }
        Ok(SentimentOutput {
            sentiment: Sentiment::Positive,
        })
    }
}

/// Memory store with a clock the test controls.
pub struct FixedClockStore {
    inner: MemoryStore,
    now: AtomicI64,
}

impl FixedClockStore {
    pub fn new(now_ms: i64) -> Self {
        Self {
            inner: MemoryStore::new(),
            now: AtomicI64::new(now_ms),
        }
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for FixedClockStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
