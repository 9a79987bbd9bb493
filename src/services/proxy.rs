//! Gatekeeping for the `/api/tmdb` passthrough.
//!
//! Only endpoints matching a fixed allow-list reach the upstream, and only
//! named query parameters are forwarded. Unknown parameters are dropped
//! silently; a bad endpoint is an error.
use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::error::{AppError, AppResult};

/// Longest parameter value forwarded upstream
pub const MAX_PARAM_LEN: usize = 300;
pub const MIN_PAGE: u32 = 1;
pub const MAX_PAGE: u32 = 10;

static ALLOWED_ENDPOINTS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^configuration$",
        r"^search/(movie|tv|multi|person|collection|keyword)$",
        r"^discover/(movie|tv)$",
        r"^trending/(all|movie|tv|person)/(day|week)$",
        r"^genre/(movie|tv)/list$",
        r"^(movie|tv)/(popular|top_rated|upcoming|now_playing|on_the_air|airing_today)$",
        r"^(movie|tv)/\d+$",
        r"^(movie|tv)/\d+/(similar|recommendations|credits|videos|images|external_ids|release_dates|watch/providers|reviews|keywords)$",
    ])
    .expect("endpoint allow-list patterns are valid")
});

const ALLOWED_PARAMS: &[&str] = &[
    "query",
    "page",
    "language",
    "region",
    "sort_by",
    "include_adult",
    "include_video",
    "year",
    "primary_release_year",
    "first_air_date_year",
    "with_genres",
    "without_genres",
    "with_original_language",
    "with_watch_providers",
    "watch_region",
    "watch_monetization_types",
    "vote_average.gte",
    "vote_average.lte",
    "vote_count.gte",
    "primary_release_date.gte",
    "primary_release_date.lte",
    "first_air_date.gte",
    "first_air_date.lte",
    "with_runtime.gte",
    "with_runtime.lte",
    "append_to_response",
];

/// A validated request ready to forward upstream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub endpoint: String,
    pub params: Vec<(String, String)>,
}

/// Normalizes an endpoint path and rejects anything that could escape the
/// upstream API root.
pub fn sanitize_endpoint(raw: &str) -> AppResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::MissingEndpoint);
    }

    let suspicious = trimmed.contains("..")
        || trimmed.contains('\\')
        || trimmed.contains("://")
        || trimmed.starts_with("//")
        || trimmed.contains('?')
        || trimmed.contains('#')
        || trimmed.contains('%')
        || trimmed.chars().any(char::is_whitespace);
    if suspicious {
        return Err(AppError::InvalidEndpoint(trimmed.to_string()));
    }

    let endpoint = trimmed.trim_matches('/');
    if endpoint.is_empty() {
        return Err(AppError::MissingEndpoint);
    }

    Ok(endpoint.to_string())
}

pub fn is_allowed_endpoint(endpoint: &str) -> bool {
    ALLOWED_ENDPOINTS.is_match(endpoint)
}

/// Keeps only allow-listed parameters with acceptable values
pub fn sanitize_params<I>(params: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (String, String)>,
{
    params
        .into_iter()
        .filter(|(name, value)| {
            if !ALLOWED_PARAMS.contains(&name.as_str()) {
                tracing::debug!(param = %name, "Dropping unrecognized parameter");
                return false;
            }
            if value.chars().count() > MAX_PARAM_LEN {
                tracing::debug!(param = %name, "Dropping oversized parameter value");
                return false;
            }
            if name == "page" && !is_valid_page(value) {
                tracing::debug!(page = %value, "Dropping out-of-range page");
                return false;
            }
            true
        })
        .collect()
}

fn is_valid_page(value: &str) -> bool {
    value
        .trim()
        .parse::<u32>()
        .map(|page| (MIN_PAGE..=MAX_PAGE).contains(&page))
        .unwrap_or(false)
}

/// Validates raw `/api/tmdb` query pairs. `endpoint` selects the upstream
/// path; everything else is a candidate parameter.
pub fn prepare(query: Vec<(String, String)>) -> AppResult<ProxyRequest> {
    let mut endpoint = None;
    let mut rest = Vec::with_capacity(query.len());

    for (name, value) in query {
        if name == "endpoint" {
            endpoint.get_or_insert(value);
        } else {
            rest.push((name, value));
        }
    }

    let endpoint = sanitize_endpoint(endpoint.as_deref().unwrap_or_default())?;
    if !is_allowed_endpoint(&endpoint) {
        return Err(AppError::InvalidEndpoint(endpoint));
    }

    Ok(ProxyRequest {
        endpoint,
        params: sanitize_params(rest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_allowed_endpoints() {
        for endpoint in [
            "configuration",
            "search/movie",
            "search/multi",
            "discover/tv",
            "trending/movie/week",
            "genre/movie/list",
            "movie/popular",
            "tv/airing_today",
            "movie/550",
            "tv/1396/similar",
            "movie/550/watch/providers",
        ] {
            assert!(is_allowed_endpoint(endpoint), "{} should be allowed", endpoint);
        }
    }

    #[test]
    fn test_disallowed_endpoints() {
        for endpoint in [
            "account",
            "movie/550/account_states",
            "authentication/token/new",
            "movie/abc",
            "trending/movie/month",
            "list/1",
            "discover/movie/extra",
        ] {
            assert!(!is_allowed_endpoint(endpoint), "{} should be rejected", endpoint);
        }
    }

    #[test]
    fn test_sanitize_endpoint_rejects_traversal_and_schemes() {
        for raw in [
            "../secret",
            "movie/../../etc",
            "https://evil.example/3/movie",
            "//evil.example",
            "movie/550?api_key=x",
            "movie/550#frag",
            "movie%2F550",
            "movie\\550",
        ] {
            assert!(
                matches!(sanitize_endpoint(raw), Err(AppError::InvalidEndpoint(_))),
                "{} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn test_sanitize_endpoint_trims_slashes() {
        assert_eq!(sanitize_endpoint(" /movie/550/ ").unwrap(), "movie/550");
        assert!(matches!(sanitize_endpoint(""), Err(AppError::MissingEndpoint)));
        assert!(matches!(sanitize_endpoint("///"), Err(AppError::MissingEndpoint)));
    }

    #[test]
    fn test_unknown_params_are_dropped() {
        let kept = sanitize_params(pairs(&[
            ("with_genres", "18,99"),
            ("api_key", "stolen"),
            ("callback", "x"),
            ("sort_by", "popularity.desc"),
        ]));
        assert_eq!(
            kept,
            pairs(&[("with_genres", "18,99"), ("sort_by", "popularity.desc")])
        );
    }

    #[test]
    fn test_long_values_are_dropped() {
        let long = "a".repeat(MAX_PARAM_LEN + 1);
        let exact = "b".repeat(MAX_PARAM_LEN);
        let kept = sanitize_params(vec![
            ("query".to_string(), long),
            ("language".to_string(), exact.clone()),
        ]);
        assert_eq!(kept, vec![("language".to_string(), exact)]);
    }

    #[test]
    fn test_page_must_be_in_range() {
        for page in ["0", "11", "-1", "two", "1.5"] {
            assert!(
                sanitize_params(pairs(&[("page", page)])).is_empty(),
                "page {} should be dropped",
                page
            );
        }
        assert_eq!(sanitize_params(pairs(&[("page", "1")])).len(), 1);
        assert_eq!(sanitize_params(pairs(&[("page", "10")])).len(), 1);
    }

    #[test]
    fn test_prepare_drops_page_but_keeps_request() {
        let request = prepare(pairs(&[("endpoint", "movie/550"), ("page", "11")])).unwrap();
        assert_eq!(request.endpoint, "movie/550");
        assert!(request.params.is_empty());
    }

    #[test]
    fn test_prepare_requires_endpoint() {
        assert!(matches!(
            prepare(pairs(&[("page", "1")])),
            Err(AppError::MissingEndpoint)
        ));
    }

    #[test]
    fn test_prepare_rejects_disallowed_endpoint() {
        assert!(matches!(
            prepare(pairs(&[("endpoint", "account/1/lists")])),
            Err(AppError::InvalidEndpoint(_))
        ));
        assert!(matches!(
            prepare(pairs(&[("endpoint", "../secret")])),
            Err(AppError::InvalidEndpoint(_))
        ));
    }
}
