pub mod annotator;
pub mod api;
pub mod cache;
pub mod config;
pub mod feed_id;
pub mod feed_manager;
pub mod fetcher;
pub mod llm_adapter;
pub mod merger;
pub mod pipeline;
pub mod rss_utils;
pub mod sanitizer;
pub mod store;
pub mod traits;
pub mod types;

pub use types::*;
pub use annotator::EntryAnnotator;
pub use cache::FeedCache;
pub use config::AppConfig;
pub use feed_manager::{FeedManager, FeedView};
pub use fetcher::Fetcher;
pub use llm_adapter::{GeminiAdapter, MockLlmAdapter};
pub use merger::merge_feeds;
pub use pipeline::{FeedPipeline, PipelineBuilder};
pub use sanitizer::LinkSanitizer;
pub use store::{MemoryStore, PgStore};
pub use traits::{FeedSource, KeyValueStore, SentimentClassifier, Summarizer};
