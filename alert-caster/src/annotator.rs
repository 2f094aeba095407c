//! Per-entry decoration of a merged feed with `<sourcename>` and
//! `<sentiment>` tags.

use crate::merger::entry_spans;
use crate::rss_utils::text::extract_text;
use crate::rss_utils::url::extract_hostname;
use crate::sanitizer::LinkSanitizer;
use crate::traits::SentimentClassifier;
use crate::types::{Sentiment, SentimentInput};
use regex::Regex;
use std::sync::Arc;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Body text sent to the classifier when an entry has neither content nor summary.
pub const NO_CONTENT: &str = "No content";

static LINK_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link[^>]*?href="([^"]*)"[^>]*?/>"#).expect("valid regex")
});
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title[^>]*>(.*?)</title>").expect("valid regex"));
static CONTENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<content[^>]*>(.*?)</content>").expect("valid regex"));
static SUMMARY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<summary[^>]*>(.*?)</summary>").expect("valid regex"));

/// Where a `<sentiment>` tag goes inside an entry: after `</updated>`,
/// else after `</id>`, else right before `</entry>`.
pub fn sentiment_insertion_point(entry: &str) -> usize {
    if let Some(idx) = entry.find("</updated>") {
        return idx + "</updated>".len();
    }
    if let Some(idx) = entry.find("</id>") {
        return idx + "</id>".len();
    }
    entry.rfind("</entry>").unwrap_or(entry.len())
}

/// Plain-text title and body of an entry for sentiment analysis.
pub fn entry_plain_text(entry: &str) -> SentimentInput {
    let title = TITLE_RE
        .captures(entry)
        .map(|caps| extract_text(&caps[1]))
        .unwrap_or_default();

    let content = CONTENT_RE
        .captures(entry)
        .or_else(|| SUMMARY_RE.captures(entry))
        .map(|caps| extract_text(&caps[1]))
        .unwrap_or_else(|| NO_CONTENT.to_string());

    SentimentInput { title, content }
}

pub struct EntryAnnotator {
    sanitizer: LinkSanitizer,
    classifier: Option<Arc<dyn SentimentClassifier>>,
}

impl EntryAnnotator {
    pub fn new(sanitizer: LinkSanitizer) -> Self {
        Self {
            sanitizer,
            classifier: None,
        }
    }

    /// Enable sentiment tagging.
    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn sentiment_enabled(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn sanitizer(&self) -> &LinkSanitizer {
        &self.sanitizer
    }

    /// Insert `<sourcename>` after the entry's first self-closing link tag.
    ///
    /// The host comes from a cleaned copy of the href; the href itself is
    /// left as is. Entries without such a link are returned unchanged.
    pub fn add_source_name(&self, entry: &str) -> String {
        let Some(caps) = LINK_TAG_RE.captures(entry) else {
            return entry.to_string();
        };
        let (Some(tag), Some(href)) = (caps.get(0), caps.get(1)) else {
            return entry.to_string();
        };

        let host = extract_hostname(self.sanitizer.clean_href(href.as_str()));

        let mut out = String::with_capacity(entry.len() + host.len() + 25);
        out.push_str(&entry[..tag.end()]);
        out.push_str("<sourcename>");
        out.push_str(&host);
        out.push_str("</sourcename>");
        out.push_str(&entry[tag.end()..]);
        out
    }

    /// Classify one entry. `None` when tagging is disabled or the classifier failed.
    async fn classify_entry(&self, entry: &str) -> Option<Sentiment> {
        let classifier = self.classifier.as_ref()?;
        let input = entry_plain_text(entry);

        match classifier.classify(input).await {
            Ok(output) => Some(output.sentiment),
            Err(e) => {
                warn!("Sentiment classification failed, leaving entry untagged: {}", e);
                None
            }
        }
    }

    /// Annotate a single entry span.
    pub async fn annotate_entry(&self, entry: &str) -> String {
        let mut annotated = self.add_source_name(entry);

        if let Some(sentiment) = self.classify_entry(&annotated).await {
            let at = sentiment_insertion_point(&annotated);
            annotated.insert_str(at, &format!("<sentiment>{}</sentiment>", sentiment));
        }

        annotated
    }

    /// Annotate every entry of a document, one entry at a time, keeping all
    /// text outside the entries byte-for-byte.
    pub async fn annotate_document(&self, document: &str) -> String {
        let spans = entry_spans(document);
        debug!("Annotating {} entries (sentiment: {})", spans.len(), self.sentiment_enabled());

        let mut out = String::with_capacity(document.len() + spans.len() * 64);
        let mut cursor = 0;

        for span in spans {
            out.push_str(&document[cursor..span.start]);
            out.push_str(&self.annotate_entry(&document[span.clone()]).await);
            cursor = span.end;
        }
        out.push_str(&document[cursor..]);

        out
    }
}
