//! Search client for the GDELT DOC 2.0 article list API.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::dedup::Titled;
use crate::TARGET_WEB_REQUEST;

pub const DEFAULT_GDELT_BASE_URL: &str = "https://api.gdeltproject.org/api/v2/doc/doc";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// Fetch more than we surface so deduplication still leaves enough results.
const MAX_RECORDS: usize = 10;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid date {0:?}: expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("search request timed out after {}s", REQUEST_TIMEOUT.as_secs())]
    Timeout,
    #[error("search API returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to decode search response: {0}")]
    Decode(#[source] serde_json::Error),
}

impl SearchError {
    /// Transient failures are worth retrying by the caller; decode failures
    /// and bad input are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SearchError::Request(_) | SearchError::Timeout | SearchError::Status(_)
        )
    }
}

/// A keyword search over US English-language coverage within a date window.
#[derive(Debug, Clone)]
pub struct NewsQuery {
    pub keyword: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl NewsQuery {
    pub fn new(keyword: &str, start_date: &str, end_date: &str) -> Result<Self, SearchError> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        Ok(Self {
            keyword: keyword.trim().to_string(),
            start,
            end,
        })
    }

    /// GDELT query expression. Multi-word keywords are quoted so GDELT
    /// searches for the phrase rather than OR-ing the words.
    fn expression(&self) -> String {
        if self.keyword.split_whitespace().count() > 1 {
            format!("\"{}\" sourcelang:eng sourcecountry:US", self.keyword)
        } else {
            format!("{} sourcelang:eng sourcecountry:US", self.keyword)
        }
    }
}

fn parse_date(date: &str) -> Result<NaiveDate, SearchError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| SearchError::InvalidDate(date.to_string()))
}

/// One article as returned by GDELT. Every field is optional; anything the
/// API adds beyond the known fields rides along in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub url_mobile: Option<String>,
    #[serde(default)]
    pub seendate: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub socialimage: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub sourcecountry: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Titled for ArticleRecord {
    fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Default, Deserialize)]
struct ArticleList {
    #[serde(default)]
    articles: Vec<ArticleRecord>,
}

#[derive(Clone)]
pub struct GdeltClient {
    http: Client,
    base_url: Url,
}

impl GdeltClient {
    pub fn new(base_url: Url) -> anyhow::Result<Self> {
        let http = Client::builder()
            .gzip(true)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;
        Ok(Self { http, base_url })
    }

    /// Runs a single search request and decodes the article list.
    pub async fn search(&self, query: &NewsQuery) -> Result<Vec<ArticleRecord>, SearchError> {
        let url = self.request_url(query);

        info!(target: TARGET_WEB_REQUEST, "Searching GDELT for {:?}", query.keyword);
        let response = match timeout(REQUEST_TIMEOUT, self.http.get(url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(target: TARGET_WEB_REQUEST, "GDELT request failed: {}", err);
                return Err(SearchError::Request(err));
            }
            Err(_) => {
                warn!(target: TARGET_WEB_REQUEST, "GDELT request timed out");
                return Err(SearchError::Timeout);
            }
        };

        if !response.status().is_success() {
            warn!(target: TARGET_WEB_REQUEST, "GDELT returned status {}", response.status());
            return Err(SearchError::Status(response.status()));
        }

        // GDELT reports malformed queries as a plain-text body with a 200
        // status, so decode failures are surfaced explicitly.
        let body = response.text().await.map_err(SearchError::Request)?;
        let list: ArticleList = serde_json::from_str(&body).map_err(SearchError::Decode)?;

        debug!(target: TARGET_WEB_REQUEST, "GDELT returned {} articles", list.articles.len());
        Ok(list.articles)
    }

    fn request_url(&self, query: &NewsQuery) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("query", &query.expression())
            .append_pair("mode", "artlist")
            .append_pair("maxrecords", &MAX_RECORDS.to_string())
            .append_pair("format", "json")
            .append_pair(
                "startdatetime",
                &query.start.format("%Y%m%d000000").to_string(),
            )
            .append_pair("enddatetime", &query.end.format("%Y%m%d235959").to_string());
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_word_keywords_are_quoted() {
        let query = NewsQuery::new("climate change", "2024-05-01", "2024-05-07").unwrap();
        assert_eq!(
            query.expression(),
            "\"climate change\" sourcelang:eng sourcecountry:US"
        );

        let query = NewsQuery::new("inflation", "2024-05-01", "2024-05-07").unwrap();
        assert_eq!(query.expression(), "inflation sourcelang:eng sourcecountry:US");
    }

    #[test]
    fn invalid_dates_are_rejected() {
        let err = NewsQuery::new("topic", "05/01/2024", "2024-05-07").unwrap_err();
        assert!(matches!(err, SearchError::InvalidDate(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn request_url_carries_the_date_window() {
        let client = GdeltClient::new(Url::parse(DEFAULT_GDELT_BASE_URL).unwrap()).unwrap();
        let query = NewsQuery::new("inflation", "2024-05-01", "2024-05-07").unwrap();
        let url = client.request_url(&query);
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("mode".to_string(), "artlist".to_string())));
        assert!(pairs.contains(&("maxrecords".to_string(), "10".to_string())));
        assert!(pairs.contains(&("startdatetime".to_string(), "20240501000000".to_string())));
        assert!(pairs.contains(&("enddatetime".to_string(), "20240507235959".to_string())));
    }

    #[test]
    fn records_decode_with_missing_and_unknown_fields() {
        let body = r#"{
            "articles": [
                {
                    "url": "https://example.com/a",
                    "title": "Fed Raises Rates",
                    "seendate": "20240502T120000Z",
                    "domain": "example.com",
                    "sourcecountry": "United States",
                    "isduplicate": "0"
                },
                {
                    "url": "https://example.com/b"
                }
            ]
        }"#;
        let list: ArticleList = serde_json::from_str(body).unwrap();
        assert_eq!(list.articles.len(), 2);

        let first = &list.articles[0];
        assert_eq!(first.title(), "Fed Raises Rates");
        assert_eq!(first.extra.get("isduplicate"), Some(&Value::from("0")));

        let second = &list.articles[1];
        assert_eq!(second.title(), "");
        assert!(second.seendate.is_none());
    }

    #[test]
    fn empty_response_decodes_to_no_articles() {
        let list: ArticleList = serde_json::from_str("{}").unwrap();
        assert!(list.articles.is_empty());
    }
}
