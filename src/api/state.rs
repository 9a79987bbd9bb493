use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::{
    cache::Cache,
    config::Config,
    error::{AppError, AppResult},
    services::{
        ContentAnalyzer, MetadataProvider, OpenAiAnalyzer, RateLimitRule, RateLimiter,
        TmdbProvider,
    },
};

/// Per-family request limits
#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
    /// Shared by the TMDB proxy and recommendations
    pub tmdb: RateLimitRule,
    pub analyze: RateLimitRule,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Self {
        let window = Duration::from_secs(config.rate_limit_window_secs);
        Self {
            tmdb: RateLimitRule::per_window(config.tmdb_rate_limit, window),
            analyze: RateLimitRule::per_window(config.analyze_rate_limit, window),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metadata: Arc<dyn MetadataProvider>,
    /// `None` when no analysis key is configured
    pub analyzer: Option<Arc<dyn ContentAnalyzer>>,
    pub rate_limiter: Arc<RateLimiter>,
    pub limits: RateLimits,
    /// Origin used for shareable vibe links
    pub public_base_url: Url,
}

impl AppState {
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        analyzer: Option<Arc<dyn ContentAnalyzer>>,
        limits: RateLimits,
        public_base_url: Url,
    ) -> Self {
        Self {
            metadata,
            analyzer,
            rate_limiter: Arc::new(RateLimiter::new()),
            limits,
            public_base_url,
        }
    }

    /// Wires the production TMDB provider and, if a key is set, the analyzer
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let timeout = Duration::from_secs(config.upstream_timeout_secs);

        let metadata = TmdbProvider::new(
            Cache::new(),
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            timeout,
        )?;

        let analyzer = match &config.openai_api_key {
            Some(key) => {
                let analyzer = OpenAiAnalyzer::new(
                    key.clone(),
                    config.openai_api_url.clone(),
                    config.openai_model.clone(),
                    timeout,
                )?;
                Some(Arc::new(analyzer) as Arc<dyn ContentAnalyzer>)
            }
            None => {
                tracing::warn!("OPENAI_API_KEY is not set; content analysis is disabled");
                None
            }
        };

        let public_base_url = Url::parse(&config.public_base_url).map_err(|e| {
            AppError::Internal(format!(
                "Invalid PUBLIC_BASE_URL {}: {}",
                config.public_base_url, e
            ))
        })?;

        Ok(Self::new(
            Arc::new(metadata),
            analyzer,
            RateLimits::from_config(config),
            public_base_url,
        ))
    }
}
