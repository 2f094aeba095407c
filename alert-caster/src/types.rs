use std::time::Duration;

// Core data definitions live in the interfaces crate
pub use interfaces::defs::{
    ResultEnvelope, Sentiment, SentimentInput, SentimentOutput, SummarizeInput, SummarizeOutput,
};

/// Upper bound on feeds accepted in one request.
pub const MAX_FEEDS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
    /// How much of a failed response body is carried in the error.
    pub error_body_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Alert-Caster/1.0".to_string(),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
            error_body_chars: 200,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CasterError {
    #[error("Failed to fetch {url}: {status} {body}")]
    FetchFailed { url: String, status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timed out fetching {url}")]
    Timeout { url: String },

    #[error("Feed {url} exceeds size limit: {size_mb}MB")]
    FeedTooLarge { url: String, size_mb: usize },

    #[error("Invalid feed ID: {0}")]
    InvalidFeedId(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Summarizer error: {0}")]
    Summarizer(String),

    #[error("Sentiment classifier error: {0}")]
    Classifier(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CasterError {
    /// Whether the caller sent something unusable, as opposed to a failure
    /// further down the pipeline.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CasterError::InvalidFeedId(_) | CasterError::InvalidRequest(_))
    }
}

pub type Result<T> = std::result::Result<T, CasterError>;
