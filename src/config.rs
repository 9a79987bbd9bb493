use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB v3 API key. Requests that need the upstream fail with
    /// `TMDB_API_KEY_MISSING` while this is unset.
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// OpenAI-compatible API key for content analysis
    #[serde(default)]
    pub openai_api_key: Option<String>,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Model used for content analysis
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Requests per window for the TMDB proxy and recommendations
    #[serde(default = "default_tmdb_rate_limit")]
    pub tmdb_rate_limit: u32,

    /// Requests per window for content analysis
    #[serde(default = "default_analyze_rate_limit")]
    pub analyze_rate_limit: u32,

    /// Fixed rate-limit window length in seconds
    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    /// Timeout applied to every upstream HTTP call
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Public origin used when building shareable vibe links
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_tmdb_rate_limit() -> u32 {
    120
}

fn default_analyze_rate_limit() -> u32 {
    12
}

fn default_rate_limit_window_secs() -> u64 {
    60
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>()
            .map(Config::normalized)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Treats blank keys as unset so `TMDB_API_KEY=` behaves like a missing key.
    fn normalized(mut self) -> Self {
        self.tmdb_api_key = non_blank(self.tmdb_api_key);
        self.openai_api_key = non_blank(self.openai_api_key);
        self
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
