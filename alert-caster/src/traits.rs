use crate::types::{Result, SentimentInput, SentimentOutput, SummarizeInput, SummarizeOutput};
use async_trait::async_trait;

/// Retrieves the raw body of a feed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the current body for `url`. Non-success responses are errors
    /// carrying the URL, status and a truncated body.
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// External model producing a textual summary of feed content.
#[async_trait]
pub trait Summarizer: Send + Sync {
    fn adapter_name(&self) -> String;

    async fn summarize(&self, input: SummarizeInput) -> Result<SummarizeOutput>;
}

/// External model labelling one article positive, negative or neutral.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    fn adapter_name(&self) -> String;

    async fn classify(&self, input: SentimentInput) -> Result<SentimentOutput>;
}

/// Expiring key-value persistence used by the feed cache.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
