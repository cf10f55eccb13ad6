//! Article fetching and trimming for the summarize endpoint.

use std::time::Duration;

use once_cell::sync::Lazy;
use readability::extractor;
use regex::Regex;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{info, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::TARGET_WEB_REQUEST;

/// Token budget for trimmed article text, approximated at 4 characters per
/// token.
pub const SUMMARY_TOKEN_BUDGET: usize = 1000;

const APPROX_CHARS_PER_TOKEN: usize = 4;
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("article extraction timed out after {}s", EXTRACT_TIMEOUT.as_secs())]
    Timeout,
    #[error("failed to fetch or parse article: {0}")]
    Scrape(String),
    #[error("no readable text found in article")]
    EmptyDocument,
}

impl FetchError {
    /// Scrape failures are dominated by the underlying fetch, so they are
    /// treated as transient alongside timeouts; an empty document is not.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Timeout | FetchError::Scrape(_))
    }
}

/// Downloads the article, extracts its readable text, and trims it to the
/// summary token budget on sentence boundaries.
pub async fn fetch_article_text(url: &str) -> Result<String, FetchError> {
    info!(target: TARGET_WEB_REQUEST, "Requesting extraction for URL: {}", url);

    // readability's scrape does its own blocking fetch.
    let target = url.to_string();
    let scrape = tokio::task::spawn_blocking(move || extractor::scrape(&target));

    let product = match timeout(EXTRACT_TIMEOUT, scrape).await {
        Ok(Ok(Ok(product))) => product,
        Ok(Ok(Err(e))) => {
            warn!(target: TARGET_WEB_REQUEST, "Error extracting page: {:?}", e);
            return Err(FetchError::Scrape(format!("{:?}", e)));
        }
        Ok(Err(e)) => {
            warn!(target: TARGET_WEB_REQUEST, "Extraction task failed: {}", e);
            return Err(FetchError::Scrape(e.to_string()));
        }
        Err(_) => {
            warn!(target: TARGET_WEB_REQUEST, "Extraction timed out for URL: {}", url);
            return Err(FetchError::Timeout);
        }
    };

    let text = collapse_whitespace(&product.text);
    if text.is_empty() {
        warn!(target: TARGET_WEB_REQUEST, "Extracted article is empty for URL: {}", url);
        return Err(FetchError::EmptyDocument);
    }

    Ok(truncate_to_sentences(&text, SUMMARY_TOKEN_BUDGET))
}

/// Collapses whitespace runs (newlines included) to single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Keeps whole sentences, in order, until adding the next one would exceed
/// the approximate character budget of `max_tokens`.
pub fn truncate_to_sentences(text: &str, max_tokens: usize) -> String {
    let max_chars = max_tokens * APPROX_CHARS_PER_TOKEN;
    let mut kept = String::new();
    let mut char_count = 0;

    for sentence in text.unicode_sentences() {
        let sentence = sentence.trim();
        if char_count + sentence.len() > max_chars {
            break;
        }
        kept.push_str(sentence);
        kept.push(' ');
        char_count += sentence.len();
    }

    kept.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_runs_collapse_to_single_spaces() {
        assert_eq!(
            collapse_whitespace("  One\n\ntwo\t three.\n"),
            "One two three."
        );
        assert_eq!(collapse_whitespace("\n \t "), "");
    }

    #[test]
    fn truncation_keeps_whole_sentences_within_budget() {
        let text = "First sentence here. Second sentence follows. Third one is last.";
        // 11 tokens * 4 = 44 chars: the first two sentences fit exactly
        // (20 + 24), the third (18) would push past the budget.
        let trimmed = truncate_to_sentences(text, 11);
        assert_eq!(trimmed, "First sentence here. Second sentence follows.");
    }

    #[test]
    fn truncation_stops_at_first_oversized_sentence() {
        let text = "Tiny. This sentence is far too long for the remaining budget. Tiny.";
        let trimmed = truncate_to_sentences(text, 3);
        assert_eq!(trimmed, "Tiny.");
    }

    #[test]
    fn zero_budget_yields_empty_text() {
        assert_eq!(truncate_to_sentences("Anything at all.", 0), "");
    }

    #[test]
    fn text_within_budget_is_unchanged() {
        let text = "Short piece. Nothing to trim.";
        assert_eq!(
            truncate_to_sentences(text, SUMMARY_TOKEN_BUDGET),
            "Short piece. Nothing to trim."
        );
    }

    #[test]
    fn empty_document_error_is_permanent() {
        assert!(!FetchError::EmptyDocument.is_transient());
        assert!(FetchError::Timeout.is_transient());
    }
}
