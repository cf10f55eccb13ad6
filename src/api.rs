//! HTTP surface: news search, article trimming, and summary endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::dedup::{select_unique, SelectorConfig};
use crate::extract::{self, FetchError};
use crate::gdelt::{ArticleRecord, GdeltClient, NewsQuery, SearchError};
use crate::llm::{generate_llm_response, SummarizationError};
use crate::prompts::{self, PromptArticle};
use crate::LLMParams;

const DIGEST_MAX_TOKENS: u32 = 1500;
const SYNTHESIS_MAX_TOKENS: u32 = 300;

#[derive(Clone)]
pub struct AppState {
    pub gdelt: GdeltClient,
    pub llm: LLMParams,
    pub selector: SelectorConfig,
}

/// Binds the listener and serves the API until the process exits.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/api/news", post(get_news))
        .route("/api/summarize", post(summarize))
        .route("/api/summarize_all", post(summarize_all))
        .route("/api/summarize_topic", post(summarize_topic))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing {0}")]
    MissingField(&'static str),
    #[error("Missing or invalid articles")]
    MissingArticles,
    #[error("Missing topic or bullet points")]
    MissingTopicOrBullets,
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Summarization(#[from] SummarizationError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_)
            | ApiError::MissingArticles
            | ApiError::MissingTopicOrBullets => StatusCode::BAD_REQUEST,
            // A bad date in the request body is the caller's mistake, not
            // an upstream failure.
            ApiError::Search(SearchError::InvalidDate(_)) => StatusCode::BAD_REQUEST,
            ApiError::Search(e) => transient_status(e.is_transient()),
            ApiError::Fetch(e) => transient_status(e.is_transient()),
            ApiError::Summarization(e) => transient_status(e.is_transient()),
        }
    }
}

fn transient_status(transient: bool) -> StatusCode {
    if transient {
        StatusCode::BAD_GATEWAY
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!("Request failed with {}: {}", status, self);
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

fn default_start_date() -> String {
    "2024-05-01".to_string()
}

fn default_end_date() -> String {
    "2024-05-07".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default = "default_start_date")]
    pub start_date: String,
    #[serde(default = "default_end_date")]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub articles: Vec<NewsArticle>,
}

/// The reshaped article returned to clients: always the same nine fields,
/// empty strings where GDELT had nothing.
#[derive(Debug, PartialEq, Serialize)]
pub struct NewsArticle {
    pub url: String,
    pub url_mobile: String,
    pub title: String,
    pub seendate: String,
    pub socialimage: String,
    pub domain: String,
    pub language: String,
    pub sourcecountry: String,
    pub summary: String,
}

impl From<ArticleRecord> for NewsArticle {
    fn from(record: ArticleRecord) -> Self {
        NewsArticle {
            url: record.url.unwrap_or_default(),
            url_mobile: record.url_mobile.unwrap_or_default(),
            title: record.title.unwrap_or_default(),
            seendate: first_nonempty(record.seendate, record.date),
            socialimage: record.socialimage.unwrap_or_default(),
            domain: record.domain.unwrap_or_default(),
            language: record.language.unwrap_or_default(),
            sourcecountry: record.sourcecountry.unwrap_or_default(),
            summary: first_nonempty(record.snippet, record.summary),
        }
    }
}

fn first_nonempty(primary: Option<String>, fallback: Option<String>) -> String {
    primary
        .filter(|value| !value.is_empty())
        .or(fallback)
        .unwrap_or_default()
}

async fn get_news(
    State(state): State<AppState>,
    Json(payload): Json<NewsRequest>,
) -> Result<Json<NewsResponse>, ApiError> {
    if payload.topic.trim().is_empty() {
        return Err(ApiError::MissingField("topic"));
    }

    let query = NewsQuery::new(&payload.topic, &payload.start_date, &payload.end_date)?;
    let candidates = state.gdelt.search(&query).await?;
    let selected = select_unique(candidates, state.selector);

    info!(
        "Returning {} article(s) for topic {:?}",
        selected.len(),
        payload.topic
    );

    Ok(Json(NewsResponse {
        articles: selected.into_iter().map(NewsArticle::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

async fn summarize(
    Json(payload): Json<SummarizeRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if payload.url.trim().is_empty() {
        return Err(ApiError::MissingField("url"));
    }

    let summary = extract::fetch_article_text(&payload.url).await?;
    Ok(Json(SummaryResponse { summary }))
}

#[derive(Debug, Deserialize)]
pub struct DigestRequest {
    #[serde(default)]
    pub articles: Vec<DigestArticle>,
}

#[derive(Debug, Deserialize)]
pub struct DigestArticle {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

async fn summarize_all(
    State(state): State<AppState>,
    Json(payload): Json<DigestRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if payload.articles.is_empty() {
        return Err(ApiError::MissingArticles);
    }

    let items: Vec<PromptArticle<'_>> = payload
        .articles
        .iter()
        .map(|article| PromptArticle {
            title: &article.title,
            content: &article.summary,
        })
        .collect();
    let prompt = prompts::digest_prompt(&items);

    let summary = generate_llm_response(&prompt, DIGEST_MAX_TOKENS, &state.llm).await?;
    Ok(Json(SummaryResponse { summary }))
}

#[derive(Debug, Deserialize)]
pub struct TopicSynthesisRequest {
    #[serde(default)]
    pub topic: String,
    #[serde(default, rename = "bulletPoints")]
    pub bullet_points: Vec<String>,
}

async fn summarize_topic(
    State(state): State<AppState>,
    Json(payload): Json<TopicSynthesisRequest>,
) -> Result<Json<SummaryResponse>, ApiError> {
    if payload.topic.trim().is_empty() || payload.bullet_points.is_empty() {
        return Err(ApiError::MissingTopicOrBullets);
    }

    let prompt = prompts::topic_synthesis_prompt(&payload.topic, &payload.bullet_points);
    let summary = generate_llm_response(&prompt, SYNTHESIS_MAX_TOKENS, &state.llm).await?;

    Ok(Json(SummaryResponse {
        summary: ensure_bullet_prefix(summary),
    }))
}

/// The synthesis prompt primes the model with a leading bullet; restore it
/// when the model drops it from the reply.
fn ensure_bullet_prefix(summary: String) -> String {
    if summary.starts_with('\u{2022}') {
        summary
    } else {
        format!("\u{2022} {}", summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn news_request_defaults_fill_the_date_window() {
        let request: NewsRequest = serde_json::from_str(r#"{"topic": "inflation"}"#).unwrap();
        assert_eq!(request.topic, "inflation");
        assert_eq!(request.start_date, "2024-05-01");
        assert_eq!(request.end_date, "2024-05-07");
    }

    #[test]
    fn synthesis_request_accepts_camel_case_bullets() {
        let request: TopicSynthesisRequest =
            serde_json::from_str(r#"{"topic": "rates", "bulletPoints": ["a", "b"]}"#).unwrap();
        assert_eq!(request.bullet_points, vec!["a", "b"]);

        let request: TopicSynthesisRequest = serde_json::from_str(r#"{"topic": "rates"}"#).unwrap();
        assert!(request.bullet_points.is_empty());
    }

    #[test]
    fn records_reshape_with_fallbacks_and_empty_defaults() {
        let record: ArticleRecord = serde_json::from_str(
            r#"{
                "url": "https://example.com/a",
                "title": "Fed Raises Rates",
                "seendate": "",
                "date": "20240502",
                "snippet": "",
                "summary": "A fallback snippet."
            }"#,
        )
        .unwrap();

        let article = NewsArticle::from(record);
        assert_eq!(article.url, "https://example.com/a");
        assert_eq!(article.seendate, "20240502");
        assert_eq!(article.summary, "A fallback snippet.");
        assert_eq!(article.url_mobile, "");
        assert_eq!(article.sourcecountry, "");
    }

    #[test]
    fn bullet_prefix_is_added_only_when_missing() {
        assert_eq!(
            ensure_bullet_prefix("\u{2022} Already bulleted".to_string()),
            "\u{2022} Already bulleted"
        );
        assert_eq!(
            ensure_bullet_prefix("Missing bullet".to_string()),
            "\u{2022} Missing bullet"
        );
    }

    #[test]
    fn error_statuses_distinguish_caller_and_upstream_failures() {
        assert_eq!(
            ApiError::MissingField("topic").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Search(SearchError::InvalidDate("nope".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Search(SearchError::Timeout).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Fetch(FetchError::EmptyDocument).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::Summarization(SummarizationError::Timeout).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn missing_field_errors_match_the_wire_messages() {
        assert_eq!(ApiError::MissingField("topic").to_string(), "Missing topic");
        assert_eq!(ApiError::MissingField("url").to_string(), "Missing url");
        assert_eq!(
            ApiError::MissingArticles.to_string(),
            "Missing or invalid articles"
        );
        assert_eq!(
            ApiError::MissingTopicOrBullets.to_string(),
            "Missing topic or bullet points"
        );
    }
}
