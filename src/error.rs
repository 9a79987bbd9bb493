use std::collections::BTreeMap;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Field name → validation messages, as returned in `details.field_errors`.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("TMDB API key is not configured on the server. Add TMDB_API_KEY to your environment variables and restart.")]
    MissingApiKey,

    #[error("Missing endpoint parameter")]
    MissingEndpoint,

    #[error("Endpoint is not allowed: {0}")]
    InvalidEndpoint(String),

    #[error("Too many requests. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("AI analysis is not configured on the server.")]
    AnalysisUnavailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid request")]
    Validation(FieldErrors),

    #[error("Failed to analyze content: {0}")]
    AnalysisFailed(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code carried in the `error` field
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingApiKey => "TMDB_API_KEY_MISSING",
            AppError::MissingEndpoint => "MISSING_ENDPOINT",
            AppError::InvalidEndpoint(_) => "INVALID_ENDPOINT",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::Upstream { .. } => "TMDB_UPSTREAM_ERROR",
            AppError::HttpClient(_) => "TMDB_REQUEST_FAILED",
            AppError::AnalysisUnavailable => "OPENAI_API_KEY_MISSING",
            AppError::InvalidInput(_) | AppError::Validation(_) => "INVALID_REQUEST",
            AppError::AnalysisFailed(_) => "ANALYSIS_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingApiKey | AppError::Internal(_) | AppError::AnalysisFailed(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::MissingEndpoint
            | AppError::InvalidEndpoint(_)
            | AppError::InvalidInput(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::AnalysisUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Whether a client retry can reasonably succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::RateLimited { .. } | AppError::HttpClient(_) => true,
            AppError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    fn status_message(&self) -> String {
        match self {
            // reqwest errors may embed the upstream URL, which carries the API key.
            AppError::HttpClient(_) => {
                "Could not fetch data from TMDB at this time. Please try again later.".to_string()
            }
            AppError::AnalysisFailed(_) => "Failed to analyze content".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), status = %status, "Request rejected");
        }

        let mut body = json!({
            "error": self.code(),
            "status_message": self.status_message(),
            "retryable": self.is_retryable(),
        });

        match &self {
            AppError::Upstream { status, .. } => {
                body["upstream_status"] = json!(status);
            }
            AppError::Validation(field_errors) => {
                body["details"] = json!({ "field_errors": field_errors });
            }
            _ => {}
        }

        let mut response = (status, Json(body)).into_response();

        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_status_is_passed_through() {
        let err = AppError::Upstream {
            status: 404,
            message: "The resource you requested could not be found.".to_string(),
        };
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "TMDB_UPSTREAM_ERROR");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_upstream_server_errors_are_retryable() {
        let err = AppError::Upstream {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after_secs: 17,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "17");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::MissingApiKey.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::InvalidEndpoint("../secret".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AnalysisUnavailable.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Validation(FieldErrors::new()).code(),
            "INVALID_REQUEST"
        );
    }
}
