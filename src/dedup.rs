//! Near-duplicate headline filtering for search results.
//!
//! Wire-service stories about the same event show up across outlets with
//! identical or lightly reworded titles. Before surfacing search results we
//! keep only the first of each group of near-duplicate headlines, bounded
//! by a configurable cap.

use std::collections::HashSet;

use thiserror::Error;

pub const DEFAULT_MAX_ARTICLES: usize = 4;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Returned when a similarity threshold outside `0.0..=1.0` is supplied.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("similarity threshold must be within 0.0..=1.0, got {0}")]
pub struct InvalidThreshold(pub f64);

/// Cap and similarity threshold applied when selecting articles.
#[derive(Debug, Clone, Copy)]
pub struct SelectorConfig {
    pub max_articles: usize,
    pub similarity_threshold: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            max_articles: DEFAULT_MAX_ARTICLES,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl SelectorConfig {
    /// Builds a config, rejecting thresholds outside `0.0..=1.0` (NaN included).
    pub fn new(max_articles: usize, similarity_threshold: f64) -> Result<Self, InvalidThreshold> {
        if !(0.0..=1.0).contains(&similarity_threshold) {
            return Err(InvalidThreshold(similarity_threshold));
        }
        Ok(Self {
            max_articles,
            similarity_threshold,
        })
    }
}

/// Implemented by records that carry a headline. Absent titles compare as
/// empty, which never matches anything (not even another empty title).
pub trait Titled {
    fn title(&self) -> &str;
}

/// Decides whether two headlines describe the same story.
///
/// Titles are compared case-insensitively with surrounding whitespace
/// ignored; punctuation is left as-is. In order: empty titles never match,
/// equal titles always match, a title contained in the other matches, and
/// otherwise the word sets must overlap with Jaccard similarity at or above
/// `threshold`.
pub fn titles_are_similar(title_a: &str, title_b: &str, threshold: f64) -> bool {
    let t1 = title_a.to_lowercase();
    let t1 = t1.trim();
    let t2 = title_b.to_lowercase();
    let t2 = t2.trim();

    if t1.is_empty() || t2.is_empty() {
        return false;
    }

    if t1 == t2 {
        return true;
    }

    // Syndicated headlines often differ only by an outlet prefix or suffix.
    if t1.contains(t2) || t2.contains(t1) {
        return true;
    }

    let words1: HashSet<&str> = t1.split_whitespace().collect();
    let words2: HashSet<&str> = t2.split_whitespace().collect();

    if words1.is_empty() || words2.is_empty() {
        return false;
    }

    let overlap = words1.intersection(&words2).count();
    let total_words = words1.union(&words2).count();

    overlap as f64 / total_words as f64 >= threshold
}

/// Selects at most `config.max_articles` candidates, skipping any whose
/// title is similar to one already selected.
///
/// The output preserves input order and each candidate is checked against
/// every earlier acceptance, not just the most recent. Scanning stops as
/// soon as the cap is reached; later candidates are never evaluated.
pub fn select_unique<T: Titled>(
    candidates: impl IntoIterator<Item = T>,
    config: SelectorConfig,
) -> Vec<T> {
    let mut selected: Vec<T> = Vec::with_capacity(config.max_articles);

    for candidate in candidates {
        if selected.len() >= config.max_articles {
            break;
        }

        let is_duplicate = selected.iter().any(|existing| {
            titles_are_similar(
                candidate.title(),
                existing.title(),
                config.similarity_threshold,
            )
        });

        if !is_duplicate {
            selected.push(candidate);
        }
    }

    selected
}
