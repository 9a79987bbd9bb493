//! TMDB API provider
//!
//! Forwards sanitized requests to the TMDB v3 API, appending the server-side
//! API key, and caches successful responses in-process.
//!
//! API Flow used by the recommendation pipeline:
//! 1. Discovery: /discover/movie → filtered candidate page
//! 2. Details: /movie/{id} → runtime + IMDB id for the top candidates
use std::time::Duration;

use reqwest::{header::ACCEPT, Client as HttpClient};

use crate::{
    cache::{Cache, CacheKey},
    cached,
    error::{AppError, AppResult},
    services::providers::MetadataProvider,
};

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    cache: Cache,
}

impl TmdbProvider {
    /// Creates a new TMDB provider
    ///
    /// A missing API key is not an error here: each request fails with
    /// `TMDB_API_KEY_MISSING` instead, so the rest of the service stays up.
    pub fn new(
        cache: Cache,
        api_key: Option<String>,
        api_url: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        if api_key.is_none() {
            tracing::warn!("TMDB_API_KEY is not set; metadata requests will fail");
        }

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.api_url, endpoint)
    }

    /// Pulls `status_message` out of a TMDB error body
    fn upstream_message(status: u16, body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| value["status_message"].as_str().map(str::to_string))
            .unwrap_or_else(|| format!("TMDB API error: {}", status))
    }
}

#[async_trait::async_trait]
impl MetadataProvider for TmdbProvider {
    async fn fetch_json(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> AppResult<serde_json::Value> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;
        let key = CacheKey::for_request(endpoint, params);
        let ttl = key.ttl();

        cached!(self.cache, key, ttl, async move {
            let response = self
                .http_client
                .get(self.endpoint_url(endpoint))
                .header(ACCEPT, "application/json")
                .query(&[("api_key", api_key)])
                .query(params)
                .send()
                .await
                .map_err(|e| {
                    // the url carries the api key
                    let e = e.without_url();
                    tracing::error!(endpoint = %endpoint, error = %e, "TMDB request failed");
                    AppError::HttpClient(e)
                })?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                let message = Self::upstream_message(status, &body);
                tracing::error!(
                    endpoint = %endpoint,
                    status = status,
                    status_message = %message,
                    "TMDB upstream error"
                );
                return Err(AppError::Upstream { status, message });
            }

            let body: serde_json::Value = response
                .json()
                .await
                .map_err(|e| AppError::HttpClient(e.without_url()))?;

            tracing::info!(
                endpoint = %endpoint,
                params = params.len(),
                provider = "tmdb",
                "TMDB request completed"
            );

            Ok::<_, AppError>(body)
        })
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    fn clone_for_task(&self) -> Box<dyn MetadataProvider> {
        Box::new(self.clone())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
