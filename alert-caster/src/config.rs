use crate::cache::FeedCache;
use crate::fetcher::Fetcher;
use crate::llm_adapter::{GeminiAdapter, GeminiConfig, MockLlmAdapter, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use crate::pipeline::{FeedPipeline, PipelineBuilder};
use crate::store::{MemoryStore, PgStore};
use crate::traits::{KeyValueStore, SentimentClassifier, Summarizer};
use crate::types::{CasterError, FetchConfig, Result, MAX_FEEDS_PER_REQUEST};
use clap::{Args, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmProvider {
    Gemini,
    /// Offline adapter, no API key needed.
    Mock,
}

/// Runtime settings, from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Address the HTTP API listens on.
    #[arg(long, env = "ALERT_CASTER_BIND", default_value = "127.0.0.1:9002")]
    pub bind_addr: SocketAddr,

    /// PostgreSQL URL for the feed cache; in-memory when unset.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    #[arg(long, env = "LLM_PROVIDER", value_enum, default_value_t = LlmProvider::Gemini)]
    pub llm_provider: LlmProvider,

    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    pub gemini_model: String,

    #[arg(long, env = "GEMINI_BASE_URL", default_value = DEFAULT_GEMINI_BASE_URL)]
    pub gemini_base_url: String,

    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 30)]
    pub fetch_timeout_secs: u64,

    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 60)]
    pub llm_timeout_secs: u64,

    /// Tag every entry with a model-derived sentiment.
    #[arg(long, env = "SENTIMENT_TAGGING")]
    pub sentiment_tagging: bool,

    #[arg(long, env = "MAX_FEEDS", default_value_t = MAX_FEEDS_PER_REQUEST)]
    pub max_feeds: usize,

    #[arg(long, env = "USER_AGENT", default_value = "Alert-Caster/1.0")]
    pub user_agent: String,

    #[arg(long, env = "MAX_FEED_SIZE_MB", default_value_t = 10)]
    pub max_feed_size_mb: usize,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl AppConfig {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout_seconds: self.fetch_timeout_secs,
            max_feed_size_mb: self.max_feed_size_mb,
            ..FetchConfig::default()
        }
    }

    /// Summarizer and classifier for the configured provider.
    pub fn build_llm(&self) -> Result<(Arc<dyn Summarizer>, Arc<dyn SentimentClassifier>)> {
        match self.llm_provider {
            LlmProvider::Gemini => {
                let api_key = self
                    .gemini_api_key
                    .clone()
                    .filter(|key| !key.trim().is_empty())
                    .ok_or_else(|| CasterError::Config("GEMINI_API_KEY is required for the gemini provider".to_string()))?;

                let adapter = Arc::new(GeminiAdapter::new(GeminiConfig {
                    model: self.gemini_model.clone(),
                    base_url: self.gemini_base_url.clone(),
                    timeout_seconds: self.llm_timeout_secs,
                    ..GeminiConfig::new(api_key)
                })?);
                let summarizer: Arc<dyn Summarizer> = adapter.clone();
                let classifier: Arc<dyn SentimentClassifier> = adapter;
                Ok((summarizer, classifier))
            }
            LlmProvider::Mock => {
                let adapter = Arc::new(MockLlmAdapter::new("default".to_string()));
                let summarizer: Arc<dyn Summarizer> = adapter.clone();
                let classifier: Arc<dyn SentimentClassifier> = adapter;
                Ok((summarizer, classifier))
            }
        }
    }

    pub async fn build_store(&self) -> Result<Arc<dyn KeyValueStore>> {
        match &self.database_url {
            Some(url) => Ok(Arc::new(PgStore::connect(url).await?)),
            None => {
                info!("No DATABASE_URL set, feed cache is in-memory");
                Ok(Arc::new(MemoryStore::new()))
            }
        }
    }

    pub fn build_pipeline(&self) -> Result<FeedPipeline> {
        let source = Arc::new(Fetcher::new(self.fetch_config())?);
        let (summarizer, classifier) = self.build_llm()?;

        let mut builder = PipelineBuilder::new(source, summarizer).max_feeds(self.max_feeds);
        if self.sentiment_tagging {
            builder = builder.sentiment_classifier(classifier);
        }

        Ok(builder.build())
    }

    /// Pipeline for merged XML output only. No summaries are produced, so
    /// model credentials are needed only when sentiment tagging is on.
    pub fn build_display_pipeline(&self) -> Result<FeedPipeline> {
        if self.sentiment_tagging {
            return self.build_pipeline();
        }

        let source = Arc::new(Fetcher::new(self.fetch_config())?);
        let unused = Arc::new(MockLlmAdapter::new("display-only".to_string()));
        Ok(PipelineBuilder::new(source, unused).max_feeds(self.max_feeds).build())
    }

    pub async fn build_cache(&self) -> Result<FeedCache> {
        Ok(FeedCache::new(self.build_store().await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        config: AppConfig,
    }

    fn config(args: &[&str]) -> AppConfig {
        let mut argv = vec!["alert-caster", "--llm-provider", "gemini"];
        argv.extend_from_slice(args);
        TestCli::parse_from(argv).config
    }

    #[test]
    fn gemini_without_key_is_rejected_for_summaries() {
        assert!(matches!(
            config(&["--gemini-api-key", " "]).build_pipeline(),
            Err(CasterError::Config(_))
        ));
    }

    #[test]
    fn display_pipeline_needs_no_key_without_sentiment() {
        let pipeline = config(&["--gemini-api-key", " "])
            .build_display_pipeline()
            .expect("display pipeline");
        assert!(!pipeline.sentiment_enabled());

        assert!(matches!(
            config(&["--gemini-api-key", " ", "--sentiment-tagging"]).build_display_pipeline(),
            Err(CasterError::Config(_))
        ));
    }

    #[test]
    fn gemini_with_key_builds() {
        let pipeline = config(&["--gemini-api-key", "k", "--sentiment-tagging"])
            .build_pipeline()
            .expect("pipeline");
        assert!(pipeline.sentiment_enabled());
    }
}
