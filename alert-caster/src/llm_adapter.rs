use crate::annotator::entry_plain_text;
use crate::merger::extract_entries;
use crate::rss_utils::text::truncate_chars;
use crate::traits::{SentimentClassifier, Summarizer};
use crate::types::{
    CasterError, Result, Sentiment, SentimentInput, SentimentOutput, SummarizeInput, SummarizeOutput,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Article bodies longer than this are cut before sentiment analysis.
pub const MAX_SENTIMENT_CONTENT_CHARS: usize = 4000;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

const SENTIMENT_TEMPERATURE: f32 = 0.2;

pub fn summarize_prompt(input: &SummarizeInput) -> String {
    let mut prompt = String::from(
        "You are an AI assistant that summarizes RSS feed content.\n\
         The content provided might be from a single RSS feed or multiple RSS feeds concatenated together.\n\n\
         Current RSS Feed Content:\n",
    );
    prompt.push_str(&input.current_feed);
    prompt.push_str("\n\n");

    match &input.previous_feed {
        Some(previous) => {
            prompt.push_str("Previous RSS Feed Content:\n");
            prompt.push_str(previous);
            prompt.push_str(
                "\nWhen summarizing, pay special attention to items that are new or have changed \
                 compared to this previous version.\n",
            );
        }
        None => prompt.push_str(
            "Summarize the key information from the provided RSS feed content. If multiple feeds' \
             content is present, provide a cohesive summary covering all of them.\n",
        ),
    }

    prompt.push_str("\nProvide a concise summary:");
    prompt
}

pub fn sentiment_prompt(input: &SentimentInput) -> String {
    format!(
        "Analyze the sentiment of the following news article title and content.\n\
         Respond with only one word: 'positive', 'negative', or 'neutral' based on the overall tone.\n\n\
         Title: {}\n\nContent:\n{}\n\nSentiment:",
        input.title,
        truncate_chars(&input.content, MAX_SENTIMENT_CONTENT_CHARS)
    )
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_seconds: 60,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate, or `None` when the model produced nothing.
    fn into_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Google Generative Language API adapter.
pub struct GeminiAdapter {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiAdapter {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    /// One `generateContent` call. `Ok(None)` means an empty answer.
    async fn generate(&self, prompt: &str, temperature: Option<f32>) -> std::result::Result<Option<String>, String> {
        let request = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
            generation_config: temperature.map(|temperature| GenerationConfig { temperature }),
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("model returned HTTP {}: {}", status.as_u16(), truncate_chars(&body, 200)));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("response parse error: {}", e))?;

        Ok(parsed.into_text())
    }
}

#[async_trait]
impl Summarizer for GeminiAdapter {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.config.model)
    }

    async fn summarize(&self, input: SummarizeInput) -> Result<SummarizeOutput> {
        info!(
            "Requesting summary for {} bytes of feed content (diff mode: {})",
            input.current_feed.len(),
            input.previous_feed.is_some()
        );

        match self.generate(&summarize_prompt(&input), None).await {
            Ok(Some(summary)) => Ok(SummarizeOutput {
                summary: summary.trim().to_string(),
            }),
            Ok(None) => Err(CasterError::Summarizer("model returned no summary".to_string())),
            Err(e) => Err(CasterError::Summarizer(e)),
        }
    }
}

#[async_trait]
impl SentimentClassifier for GeminiAdapter {
    fn adapter_name(&self) -> String {
        format!("Gemini ({})", self.config.model)
    }

    /// Any failure or unusable answer is reported as neutral.
    async fn classify(&self, input: SentimentInput) -> Result<SentimentOutput> {
        let sentiment = match self.generate(&sentiment_prompt(&input), Some(SENTIMENT_TEMPERATURE)).await {
            Ok(Some(text)) => text.parse::<Sentiment>().unwrap_or_else(|e| {
                warn!("Sentiment analysis for {:?} gave {}, defaulting to neutral", input.title, e);
                Sentiment::Neutral
            }),
            Ok(None) => {
                warn!("Sentiment analysis returned no output for {:?}", input.title);
                Sentiment::Neutral
            }
            Err(e) => {
                warn!("Sentiment analysis failed for {:?}: {}", input.title, e);
                Sentiment::Neutral
            }
        };

        debug!("Sentiment for {:?}: {}", input.title, sentiment);
        Ok(SentimentOutput { sentiment })
    }
}

/// Offline adapter for development and testing
pub struct MockLlmAdapter {
    name: String,
    response_delay_ms: u64,
}

const POSITIVE_WORDS: &[&str] = &[
    "gain", "gains", "growth", "win", "wins", "success", "record", "approved", "launch", "improve",
    "improves", "breakthrough", "celebrate", "award",
];

const NEGATIVE_WORDS: &[&str] = &[
    "loss", "losses", "fail", "fails", "failed", "crash", "lawsuit", "ban", "banned", "recall",
    "warning", "decline", "cuts", "layoffs", "breach",
];

impl MockLlmAdapter {
    pub fn new(name: String) -> Self {
        Self {
            name,
            response_delay_ms: 0,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    async fn simulate_processing(&self) {
        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }
    }

    fn titles(feed: &str) -> Vec<String> {
        extract_entries(feed)
            .into_iter()
            .map(|entry| entry_plain_text(entry).title)
            .filter(|title| !title.is_empty())
            .collect()
    }

    fn score(text: &str) -> i32 {
        text.split_whitespace()
            .map(|word| word.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase())
            .map(|word| {
                if POSITIVE_WORDS.contains(&word.as_str()) {
                    1
                } else if NEGATIVE_WORDS.contains(&word.as_str()) {
                    -1
                } else {
                    0
                }
            })
            .sum()
    }
}

#[async_trait]
impl Summarizer for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn summarize(&self, input: SummarizeInput) -> Result<SummarizeOutput> {
        self.simulate_processing().await;

        let titles = Self::titles(&input.current_feed);
        let mut summary = format!("{} entries in the current feed content.", titles.len());

        if let Some(previous) = &input.previous_feed {
            let seen: HashSet<String> = Self::titles(previous).into_iter().collect();
            let new_titles: Vec<&String> = titles.iter().filter(|t| !seen.contains(*t)).collect();
            summary.push_str(&format!(" Changes since previous snapshot: {} new.", new_titles.len()));
            for title in new_titles.iter().take(5) {
                summary.push_str(&format!("\n- {}", title));
            }
        } else {
            for title in titles.iter().take(5) {
                summary.push_str(&format!("\n- {}", title));
            }
        }

        Ok(SummarizeOutput { summary })
    }
}

#[async_trait]
impl SentimentClassifier for MockLlmAdapter {
    fn adapter_name(&self) -> String {
        format!("Mock LLM Adapter ({})", self.name)
    }

    async fn classify(&self, input: SentimentInput) -> Result<SentimentOutput> {
        self.simulate_processing().await;

        let text = format!("{} {}", input.title, truncate_chars(&input.content, MAX_SENTIMENT_CONTENT_CHARS));
        let sentiment = match Self::score(&text) {
            s if s > 0 => Sentiment::Positive,
            s if s < 0 => Sentiment::Negative,
            _ => Sentiment::Neutral,
        };

        Ok(SentimentOutput { sentiment })
    }
}
