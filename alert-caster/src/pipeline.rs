use crate::annotator::EntryAnnotator;
use crate::fetcher::fetch_all;
use crate::merger::merge_feeds;
use crate::rss_utils::url::is_valid_feed_url;
use crate::sanitizer::LinkSanitizer;
use crate::traits::{FeedSource, SentimentClassifier, Summarizer};
use crate::types::{CasterError, Result, ResultEnvelope, SummarizeInput, MAX_FEEDS_PER_REQUEST};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Fetches, merges, annotates and summarizes a set of feeds.
pub struct FeedPipeline {
    source: Arc<dyn FeedSource>,
    summarizer: Arc<dyn Summarizer>,
    annotator: EntryAnnotator,
    max_feeds: usize,
}

impl FeedPipeline {
    /// Reject empty, oversized or non-HTTP URL lists before any fetch.
    pub fn validate_urls<S: AsRef<str>>(&self, urls: &[S]) -> Result<()> {
        if urls.is_empty() {
            return Err(CasterError::InvalidRequest("at least one feed URL is required".to_string()));
        }
        if urls.len() > self.max_feeds {
            return Err(CasterError::InvalidRequest(format!(
                "{} feed URLs given, at most {} allowed",
                urls.len(),
                self.max_feeds
            )));
        }
        if let Some(bad) = urls.iter().map(AsRef::as_ref).find(|url| !is_valid_feed_url(url)) {
            return Err(CasterError::InvalidRequest(format!("not an http(s) URL: {}", bad)));
        }
        Ok(())
    }

    pub fn sentiment_enabled(&self) -> bool {
        self.annotator.sentiment_enabled()
    }

    /// Display document for already fetched feeds: merged, annotated, then
    /// cleaned of redirect and tracking residue in every href.
    pub async fn build_display_document<S: AsRef<str>>(&self, documents: &[S]) -> String {
        let merged = merge_feeds(documents);
        let annotated = self.annotator.annotate_document(&merged).await;
        self.annotator
            .sanitizer()
            .sanitize_document(&annotated)
            .into_owned()
    }

    /// Body of a single feed exactly as fetched.
    pub async fn fetch_raw(&self, url: &str) -> Result<String> {
        self.validate_urls(&[url])?;
        self.source.fetch(url).await
    }

    /// Fetch and build the display document without summarizing.
    pub async fn merged_document<S: AsRef<str>>(&self, urls: &[S]) -> Result<String> {
        self.validate_urls(urls)?;
        let documents = fetch_all(self.source.as_ref(), urls).await?;
        Ok(self.build_display_document(&documents).await)
    }

    /// Run one full processing request.
    ///
    /// `previous` is only honoured for single-feed requests; the summarizer
    /// then sees it next to the current content to describe what changed.
    pub async fn process<S: AsRef<str>>(&self, urls: &[S], previous: Option<&str>) -> Result<ResultEnvelope> {
        self.validate_urls(urls)?;

        let request_id = Uuid::new_v4();
        let span = info_span!("process_feeds", %request_id, feeds = urls.len());

        self.run(urls, previous).instrument(span).await
    }

    async fn run<S: AsRef<str>>(&self, urls: &[S], previous: Option<&str>) -> Result<ResultEnvelope> {
        info!("Processing {} feed(s)", urls.len());

        let documents = fetch_all(self.source.as_ref(), urls).await.map_err(|e| {
            error!("Feed fetch failed: {}", e);
            e
        })?;

        let merged_content = self.build_display_document(&documents).await;

        let previous_feed = match (urls.len(), previous) {
            (1, Some(previous)) if !previous.is_empty() => Some(previous.to_string()),
            _ => None,
        };

        let input = SummarizeInput {
            current_feed: documents.join("\n\n"),
            previous_feed,
        };

        // Only single-feed requests fail on a summarizer error.
        let summary = match self.summarizer.summarize(input).await {
            Ok(output) => output.summary,
            Err(e) if urls.len() > 1 => {
                warn!(
                    "Summarization via {} failed, returning merged feeds without summary: {}",
                    self.summarizer.adapter_name(),
                    e
                );
                String::new()
            }
            Err(e) => {
                error!("Summarization via {} failed: {}", self.summarizer.adapter_name(), e);
                return Err(e);
            }
        };

        info!("Processed {} feed(s) into {} bytes", urls.len(), merged_content.len());

        Ok(ResultEnvelope {
            merged_content,
            summary,
            timestamp: Utc::now().timestamp_millis(),
            source_urls: urls.iter().map(|url| url.as_ref().to_string()).collect(),
        })
    }
}

/// Pipeline builder for easier configuration
pub struct PipelineBuilder {
    source: Arc<dyn FeedSource>,
    summarizer: Arc<dyn Summarizer>,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    sanitizer: LinkSanitizer,
    max_feeds: usize,
}

impl PipelineBuilder {
    pub fn new(source: Arc<dyn FeedSource>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            source,
            summarizer,
            classifier: None,
            sanitizer: LinkSanitizer::default(),
            max_feeds: MAX_FEEDS_PER_REQUEST,
        }
    }

    pub fn sentiment_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn sanitizer(mut self, sanitizer: LinkSanitizer) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    pub fn max_feeds(mut self, max_feeds: usize) -> Self {
        self.max_feeds = max_feeds.max(1);
        self
    }

    pub fn build(self) -> FeedPipeline {
        let mut annotator = EntryAnnotator::new(self.sanitizer);
        if let Some(classifier) = self.classifier {
            annotator = annotator.with_classifier(classifier);
        }

        FeedPipeline {
            source: self.source,
            summarizer: self.summarizer,
            annotator,
            max_feeds: self.max_feeds,
        }
    }
}
