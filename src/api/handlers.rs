use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{AppError, AppResult, FieldErrors};
use crate::models::{
    streaming_service::{COUNTRIES, DEFAULT_COUNTRY, DEFAULT_SERVICE_KEY, STREAMING_SERVICES},
    CountryOption, RecommendedTitle, StreamingServiceOption, VibeLink, VibeParams, WatchWith,
};
use crate::services::{
    analysis::{ContentAnalysis, RawAnalyzeRequest},
    fallback::FallbackTier,
    proxy,
    rate_limiter::client_ip,
    recommendations,
};

use super::AppState;

// Request/Response types

#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub key: &'static str,
    pub label: &'static str,
    pub provider_id: u32,
}

impl From<&StreamingServiceOption> for ServiceSummary {
    fn from(service: &StreamingServiceOption) -> Self {
        Self {
            key: service.key,
            label: service.label,
            provider_id: service.provider_id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    #[serde(flatten)]
    pub service: ServiceSummary,
    pub countries: Vec<CountryOption>,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub services: Vec<ServiceResponse>,
    pub countries: &'static [CountryOption],
    pub default_service: &'static str,
    pub default_country: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RecommendationsResponse {
    pub tier: FallbackTier,
    pub service: ServiceSummary,
    pub country: &'static str,
    pub watch_with: WatchWith,
    pub vibe_url: String,
    pub results: Vec<RecommendedTitle>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<u64>,
    pub title: String,
    pub analysis: ContentAnalysis,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Streaming services and the countries each is offered in
pub async fn get_services() -> Json<CatalogResponse> {
    let services = STREAMING_SERVICES
        .iter()
        .map(|service| ServiceResponse {
            service: ServiceSummary::from(service),
            countries: service.country_options(),
        })
        .collect();

    Json(CatalogResponse {
        services,
        countries: COUNTRIES,
        default_service: DEFAULT_SERVICE_KEY,
        default_country: DEFAULT_COUNTRY,
    })
}

/// Allow-listed passthrough to TMDB
pub async fn tmdb_proxy(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
) -> AppResult<Json<Value>> {
    let ip = client_ip(&headers);
    state
        .rate_limiter
        .enforce(&format!("tmdb:{}", ip), state.limits.tmdb)?;

    if !state.metadata.has_credentials() {
        return Err(AppError::MissingApiKey);
    }

    let request = proxy::prepare(query)?;
    tracing::debug!(
        endpoint = %request.endpoint,
        params = request.params.len(),
        "Proxying TMDB request"
    );

    let body = state
        .metadata
        .fetch_json(&request.endpoint, &request.params)
        .await?;
    Ok(Json(body))
}

/// Runs the recommendation pipeline for a vibe link
pub async fn get_recommendations(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<VibeParams>, QueryRejection>,
) -> AppResult<Json<RecommendationsResponse>> {
    let ip = client_ip(&headers);
    state
        .rate_limiter
        .enforce(&format!("recommend:{}", ip), state.limits.tmdb)?;

    let Query(params) = query.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;

    let link = VibeLink::from(params);
    if link.selection.mood.is_none() {
        return Err(AppError::InvalidInput(
            "mood must be one of happy, sad, excited, relaxed, thoughtful, energetic".to_string(),
        ));
    }

    let result = recommendations::recommend(
        state.metadata.as_ref(),
        &link.selection,
        Utc::now().date_naive(),
    )
    .await?;

    let selection = &link.selection;
    Ok(Json(RecommendationsResponse {
        tier: result.tier,
        service: ServiceSummary::from(selection.service),
        country: selection.country,
        watch_with: selection.watch_with,
        vibe_url: link.to_url(&state.public_base_url).to_string(),
        results: result.titles,
    }))
}

/// AI mood analysis for a single title
pub async fn analyze_content(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RawAnalyzeRequest>, JsonRejection>,
) -> AppResult<Json<AnalyzeResponse>> {
    let ip = client_ip(&headers);
    state
        .rate_limiter
        .enforce(&format!("analyze:{}", ip), state.limits.analyze)?;

    let analyzer = state.analyzer.as_ref().ok_or(AppError::AnalysisUnavailable)?;

    let Json(raw) = body.map_err(|rejection| {
        let mut errors = FieldErrors::new();
        errors.insert("body".to_string(), vec![rejection.body_text()]);
        AppError::Validation(errors)
    })?;
    let request = raw.validate()?;

    let analysis = analyzer.analyze(&request).await?;

    Ok(Json(AnalyzeResponse {
        movie_id: request.movie_id,
        title: request.title,
        analysis,
    }))
}
