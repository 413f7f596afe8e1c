//! Rerankers for re-scoring and reordering search results.
//!
//! Every strategy is pure with respect to its inputs: the same query and
//! result list always produce the same output, and an empty input is a
//! valid input producing an empty output.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A reranker that re-scores and reorders search results.
///
/// Implementations improve precision beyond the initial similarity
/// ordering; none of the built-in strategies can fail on well-formed
/// input.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank search results given the original query.
    ///
    /// Returns results in a new order with potentially updated scores,
    /// sorted by descending score.
    async fn rerank(&self, query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>>;
}

/// A no-op reranker that returns results unchanged.
///
/// Useful as a default when no reranking is needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReranker;

#[async_trait]
impl Reranker for NoOpReranker {
    async fn rerank(&self, _query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>> {
        Ok(results)
    }
}

/// Common English words ignored during keyword extraction.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "day", "get", "has", "him", "his", "how", "man", "new", "now", "old", "see",
    "two", "way", "who", "with", "that", "this", "from", "they", "will", "what", "when", "where",
    "which", "their", "there", "about", "would", "could", "should",
];

/// Maximum number of query keywords considered per rerank.
const MAX_KEYWORDS: usize = 10;

/// Score multiplier contributed by each keyword occurrence.
const BOOST_PER_OCCURRENCE: f32 = 0.1;

/// Boosts scores of results whose content contains the query's keywords.
///
/// Up to [ten](MAX_KEYWORDS) keywords are extracted from the lower-cased
/// query by word-splitting, dropping stop words and tokens of length two
/// or less. Each result's score is rescaled as
/// `score * (1 + occurrences * 0.1)` where `occurrences` counts every
/// keyword occurrence (repeats included) in the lower-cased chunk text,
/// then results are stably sorted by descending score — equal scores keep
/// their input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordReranker;

impl KeywordReranker {
    /// Create a new `KeywordReranker`.
    pub fn new() -> Self {
        Self
    }

    fn keywords(query: &str) -> Vec<String> {
        query
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
            .take(MAX_KEYWORDS)
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl Reranker for KeywordReranker {
    async fn rerank(&self, query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>> {
        let keywords = Self::keywords(query);

        let mut rescored: Vec<SearchResult> = results
            .into_iter()
            .map(|mut result| {
                let content = result.chunk.text.to_lowercase();
                let occurrences: usize =
                    keywords.iter().map(|kw| content.matches(kw.as_str()).count()).sum();
                result.score *= 1.0 + occurrences as f32 * BOOST_PER_OCCURRENCE;
                result
            })
            .collect();

        // Stable sort: equal rescaled scores preserve input order.
        rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(rescored)
    }
}

/// Rescores results by reciprocal rank fusion: `1 / (k + rank + 1)`.
///
/// `rank` is the zero-based position in the input order; `k` is the
/// smoothing constant (default 60 — higher values flatten the influence
/// of top ranks). Meant to run on a list that is already an ordered
/// fusion of multiple ranked lists, not on a single raw similarity
/// ordering.
#[derive(Debug, Clone, Copy)]
pub struct RrfReranker {
    k: usize,
}

impl RrfReranker {
    /// Default smoothing constant.
    pub const DEFAULT_K: usize = 60;

    /// Create an `RrfReranker` with the default `k` of 60.
    pub fn new() -> Self {
        Self { k: Self::DEFAULT_K }
    }

    /// Create an `RrfReranker` with a custom smoothing constant.
    pub fn with_k(k: usize) -> Self {
        Self { k }
    }
}

impl Default for RrfReranker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Reranker for RrfReranker {
    async fn rerank(&self, _query: &str, results: Vec<SearchResult>) -> Result<Vec<SearchResult>> {
        let mut rescored: Vec<SearchResult> = results
            .into_iter()
            .enumerate()
            .map(|(rank, mut result)| {
                result.score = 1.0 / (self.k as f32 + rank as f32 + 1.0);
                result
            })
            .collect();

        rescored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        Ok(rescored)
    }
}
