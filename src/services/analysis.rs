//! AI content-mood analysis
//!
//! Requests are validated into an [`AnalysisRequest`] before any model call
//! is made. Model output is held to [`ContentAnalysis`] limits; anything that
//! does not fit is a failure, not a partial result.
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult, FieldErrors};

const MAX_TITLE_CHARS: usize = 200;
const MAX_OVERVIEW_CHARS: usize = 4000;
const MAX_GENRES: usize = 20;
const MAX_GENRE_CHARS: usize = 50;

const MAX_MOODS: usize = 5;
const MAX_THEMES: usize = 10;
const MAX_SIMILAR: usize = 10;
const MAX_VIEWING_CONTEXTS: usize = 6;
const MAX_WARNINGS: usize = 10;
const MAX_ANALYSIS_CHARS: usize = 2000;

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1000;

/// Body of `POST /api/analyze-content` before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalyzeRequest {
    #[serde(default)]
    pub movie_id: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub overview: Option<Value>,
    #[serde(default)]
    pub genres: Option<Value>,
}

/// A validated analysis request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub movie_id: Option<u64>,
    pub title: String,
    pub overview: String,
    pub genres: Vec<String>,
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn bounded_text(
    value: Option<&Value>,
    field: &str,
    max_chars: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    let Some(text) = value.and_then(Value::as_str) else {
        push_error(errors, field, "Required string");
        return None;
    };

    let trimmed = text.trim();
    let len = trimmed.chars().count();
    if len == 0 {
        push_error(errors, field, "Must not be empty");
        None
    } else if len > max_chars {
        push_error(errors, field, format!("Must be at most {} characters", max_chars));
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn movie_id(value: Option<&Value>, errors: &mut FieldErrors) -> Option<u64> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            push_error(errors, "movieId", "Must be a non-negative integer");
            None
        }),
        Some(Value::String(s)) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
            s.parse().ok().or_else(|| {
                push_error(errors, "movieId", "Out of range");
                None
            })
        }
        Some(_) => {
            push_error(errors, "movieId", "Must be a non-negative integer or digit string");
            None
        }
    }
}

fn genres(value: Option<&Value>, errors: &mut FieldErrors) -> Vec<String> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            push_error(errors, "genres", "Must be an array of strings");
            return Vec::new();
        }
    };

    if items.len() > MAX_GENRES {
        push_error(errors, "genres", format!("At most {} genres", MAX_GENRES));
    }

    let mut genres = Vec::with_capacity(items.len());
    for item in items {
        match item.as_str().map(str::trim) {
            Some(genre) if !genre.is_empty() && genre.chars().count() <= MAX_GENRE_CHARS => {
                genres.push(genre.to_string())
            }
            _ => push_error(
                errors,
                "genres",
                format!("Each genre must be 1-{} characters", MAX_GENRE_CHARS),
            ),
        }
    }
    genres
}

impl RawAnalyzeRequest {
    /// Checks every field and reports all problems at once
    pub fn validate(&self) -> AppResult<AnalysisRequest> {
        let mut errors = FieldErrors::new();

        let movie_id = movie_id(self.movie_id.as_ref(), &mut errors);
        let title = bounded_text(self.title.as_ref(), "title", MAX_TITLE_CHARS, &mut errors);
        let overview = bounded_text(
            self.overview.as_ref(),
            "overview",
            MAX_OVERVIEW_CHARS,
            &mut errors,
        );
        let genres = genres(self.genres.as_ref(), &mut errors);

        match (title, overview) {
            (Some(title), Some(overview)) if errors.is_empty() => Ok(AnalysisRequest {
                movie_id,
                title,
                overview,
                genres,
            }),
            _ => Err(AppError::Validation(errors)),
        }
    }
}

/// Structured insight returned by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub mood: Vec<String>,
    pub themes: Vec<String>,
    pub similar_content: Vec<String>,
    pub viewing_context: Vec<String>,
    pub content_warnings: Vec<String>,
    pub analysis: String,
}

impl ContentAnalysis {
    pub fn validate(self) -> AppResult<Self> {
        let checks = [
            ("mood", self.mood.len(), MAX_MOODS),
            ("themes", self.themes.len(), MAX_THEMES),
            ("similarContent", self.similar_content.len(), MAX_SIMILAR),
            ("viewingContext", self.viewing_context.len(), MAX_VIEWING_CONTEXTS),
            ("contentWarnings", self.content_warnings.len(), MAX_WARNINGS),
            ("analysis", self.analysis.chars().count(), MAX_ANALYSIS_CHARS),
        ];

        for (field, len, max) in checks {
            if len > max {
                return Err(AppError::AnalysisFailed(format!(
                    "{} exceeds limit ({} > {})",
                    field, len, max
                )));
            }
        }

        Ok(self)
    }
}

/// Trait for content analysis backends
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> AppResult<ContentAnalysis>;

    fn name(&self) -> &'static str;
}

/// Builds the prompt sent to the model
pub fn build_prompt(request: &AnalysisRequest) -> String {
    format!(
        "Analyze the following movie or show.\n\n\
         Title: {title}\n\
         Overview: {overview}\n\
         Genres: {genres}\n\n\
         Provide:\n\
         1. Mood: the moods this content evokes (e.g. uplifting, tense, melancholic)\n\
         2. Themes: the main themes explored\n\
         3. Similar Content: other movies or shows a fan might enjoy\n\
         4. Viewing Context: when it is best watched (e.g. date night, family movie night, solo viewing)\n\
         5. Content Warnings: elements viewers should be aware of (violence, emotional intensity, etc.)\n\n\
         Respond with a JSON object of this shape:\n\
         {{\"mood\": [string], \"themes\": [string], \"similarContent\": [string], \
         \"viewingContext\": [string], \"contentWarnings\": [string], \"analysis\": string}}\n\
         Use at most {moods} moods, {themes} themes, {similar} similar titles, \
         {contexts} viewing contexts and {warnings} warnings, and keep \"analysis\" \
         to one paragraph under {chars} characters.",
        title = request.title,
        overview = request.overview,
        genres = request.genres.join(", "),
        moods = MAX_MOODS,
        themes = MAX_THEMES,
        similar = MAX_SIMILAR,
        contexts = MAX_VIEWING_CONTEXTS,
        warnings = MAX_WARNINGS,
        chars = MAX_ANALYSIS_CHARS,
    )
}

/// Content analyzer backed by an OpenAI-compatible chat-completions API
#[derive(Clone)]
pub struct OpenAiAnalyzer {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiAnalyzer {
    pub fn new(api_key: String, api_url: String, model: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn request_body(&self, request: &AnalysisRequest) -> Value {
        json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "user", "content": build_prompt(request) }
            ],
        })
    }
}

/// Extracts and validates the analysis from a chat-completions response
pub fn parse_completion(body: &Value) -> AppResult<ContentAnalysis> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| AppError::AnalysisFailed("response has no message content".to_string()))?;

    let analysis: ContentAnalysis = serde_json::from_str(content)
        .map_err(|e| AppError::AnalysisFailed(format!("response does not match schema: {}", e)))?;

    analysis.validate()
}

#[async_trait::async_trait]
impl ContentAnalyzer for OpenAiAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> AppResult<ContentAnalysis> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| AppError::AnalysisFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                body = %body,
                model = %self.model,
                "Analysis API error"
            );
            return Err(AppError::AnalysisFailed(format!("upstream status {}", status)));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::AnalysisFailed(e.to_string()))?;

        let analysis = parse_completion(&body)?;

        tracing::info!(
            movie_id = ?request.movie_id,
            title = %request.title,
            model = %self.model,
            "Content analysis completed"
        );

        Ok(analysis)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(value: Value) -> RawAnalyzeRequest {
        serde_json::from_value(value).unwrap()
    }

    fn sample_analysis() -> Value {
        json!({
            "mood": ["tense", "bleak"],
            "themes": ["identity"],
            "similarContent": ["Memento"],
            "viewingContext": ["solo viewing"],
            "contentWarnings": ["violence"],
            "analysis": "A study of masculinity and consumerism."
        })
    }

    #[test]
    fn test_valid_request() {
        let request = raw(json!({
            "movieId": "550",
            "title": "  Fight Club ",
            "overview": "An insomniac office worker...",
            "genres": ["Drama", " Thriller "]
        }))
        .validate()
        .unwrap();

        assert_eq!(request.movie_id, Some(550));
        assert_eq!(request.title, "Fight Club");
        assert_eq!(request.genres, vec!["Drama", "Thriller"]);
    }

    #[test]
    fn test_genres_and_movie_id_are_optional() {
        let request = raw(json!({ "title": "Up", "overview": "A balloon house." }))
            .validate()
            .unwrap();
        assert_eq!(request.movie_id, None);
        assert!(request.genres.is_empty());
    }

    #[test]
    fn test_invalid_fields_are_all_reported() {
        let err = raw(json!({
            "movieId": -4,
            "title": "   ",
            "overview": "x".repeat(MAX_OVERVIEW_CHARS + 1),
            "genres": ["Drama", ""]
        }))
        .validate()
        .unwrap_err();

        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["genres", "movieId", "overview", "title"]);
    }

    #[test]
    fn test_movie_id_rejects_non_digit_strings() {
        let err = raw(json!({ "movieId": "55a", "title": "A", "overview": "B" }))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(errors) if errors.contains_key("movieId")));
    }

    #[test]
    fn test_too_many_genres() {
        let genres: Vec<String> = (0..=MAX_GENRES).map(|i| format!("g{}", i)).collect();
        let err = raw(json!({ "title": "A", "overview": "B", "genres": genres }))
            .validate()
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(errors) if errors.contains_key("genres")));
    }

    #[test]
    fn test_parse_completion() {
        let body = json!({
            "choices": [{ "message": { "content": sample_analysis().to_string() } }]
        });
        let analysis = parse_completion(&body).unwrap();
        assert_eq!(analysis.similar_content, vec!["Memento"]);
    }

    #[test]
    fn test_parse_completion_rejects_oversized_lists() {
        let mut content = sample_analysis();
        content["mood"] = json!(["a", "b", "c", "d", "e", "f"]);
        let body = json!({ "choices": [{ "message": { "content": content.to_string() } }] });
        assert!(matches!(
            parse_completion(&body),
            Err(AppError::AnalysisFailed(_))
        ));
    }

    #[test]
    fn test_parse_completion_rejects_missing_fields() {
        let body = json!({ "choices": [{ "message": { "content": "{\"mood\": []}" } }] });
        assert!(matches!(
            parse_completion(&body),
            Err(AppError::AnalysisFailed(_))
        ));
        assert!(matches!(
            parse_completion(&json!({})),
            Err(AppError::AnalysisFailed(_))
        ));
    }

    #[test]
    fn test_request_body_settings() {
        let analyzer = OpenAiAnalyzer::new(
            "sk-test".to_string(),
            "http://test.local/v1/".to_string(),
            "gpt-4o".to_string(),
            Duration::from_secs(1),
        )
        .unwrap();
        let request = AnalysisRequest {
            movie_id: None,
            title: "Up".to_string(),
            overview: "A balloon house.".to_string(),
            genres: vec!["Animation".to_string()],
        };

        let body = analyzer.request_body(&request);
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["temperature"], 0.7);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert!(body["messages"][0]["content"]
            .as_str()
            .unwrap()
            .contains("Genres: Animation"));
        assert_eq!(analyzer.api_url, "http://test.local/v1");
    }
}
