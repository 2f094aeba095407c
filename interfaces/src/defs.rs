use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input to the external summarization model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeInput {
    /// One feed, or several raw feeds concatenated with blank lines.
    pub current_feed: String,
    /// Previous snapshot of a single feed, used to highlight deltas.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_feed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizeOutput {
    pub summary: String,
}

/// Overall tone of one article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSentiment(pub String);

impl fmt::Display for UnknownSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown sentiment label: {:?}", self.0)
    }
}

impl std::error::Error for UnknownSentiment {}

impl FromStr for Sentiment {
    type Err = UnknownSentiment;

    /// Accepts model output loosely: case, surrounding quotes and trailing
    /// punctuation are ignored, and only the first word counts.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s
            .split_whitespace()
            .next()
            .unwrap_or("")
            .trim_matches(|c: char| !c.is_alphabetic())
            .to_lowercase();

        match word.as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            _ => Err(UnknownSentiment(s.to_string())),
        }
    }
}

/// Plain-text article handed to the sentiment classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentInput {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentOutput {
    pub sentiment: Sentiment,
}

/// Outcome of one processing request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEnvelope {
    pub merged_content: String,
    pub summary: String,
    /// Completion time, epoch milliseconds.
    pub timestamp: i64,
    pub source_urls: Vec<String>,
}
