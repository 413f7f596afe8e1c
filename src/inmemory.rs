//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It speaks
//! the point-match filter dialect and evaluates compiled filters against
//! chunk metadata, which makes it suitable for development, testing, and
//! small-scale use.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use serde_json::Value;

use crate::dialect::DialectKind;
use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory [`VectorStore`] using cosine similarity for search.
///
/// Chunks are stored in a chunk-ID-keyed map behind a
/// `tokio::sync::RwLock`, so concurrent readers and writers are safe.
/// Declares [`DialectKind::PointMatch`] and evaluates compiled
/// point-match filters in-process.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    chunks: tokio::sync::RwLock<HashMap<String, Chunk>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored chunks.
    pub async fn len(&self) -> usize {
        self.chunks.read().await.len()
    }

    /// Whether the store holds no chunks.
    pub async fn is_empty(&self) -> bool {
        self.chunks.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

fn malformed(detail: &str, clause: &Value) -> RagError {
    RagError::FilterError(format!("malformed point-match filter ({detail}): {clause}"))
}

/// Evaluate a compiled point-match group against chunk metadata.
///
/// An empty or absent clause list is vacuously true, so the empty filter
/// `{}` matches everything.
fn eval_group(group: &Value, metadata: &BTreeMap<String, Value>) -> Result<bool> {
    let object = group.as_object().ok_or_else(|| malformed("group is not an object", group))?;

    if let Some(must) = object.get("must") {
        for clause in must.as_array().ok_or_else(|| malformed("must is not an array", group))? {
            if !eval_clause(clause, metadata)? {
                return Ok(false);
            }
        }
    }

    if let Some(should) = object.get("should") {
        let clauses =
            should.as_array().ok_or_else(|| malformed("should is not an array", group))?;
        if !clauses.is_empty() {
            let mut any = false;
            for clause in clauses {
                if eval_clause(clause, metadata)? {
                    any = true;
                    break;
                }
            }
            if !any {
                return Ok(false);
            }
        }
    }

    if let Some(must_not) = object.get("must_not") {
        for clause in
            must_not.as_array().ok_or_else(|| malformed("must_not is not an array", group))?
        {
            if eval_clause(clause, metadata)? {
                return Ok(false);
            }
        }
    }

    Ok(true)
}

fn eval_clause(clause: &Value, metadata: &BTreeMap<String, Value>) -> Result<bool> {
    let object = clause.as_object().ok_or_else(|| malformed("clause is not an object", clause))?;

    // Leaf clauses carry a "key"; everything else is a nested group.
    let Some(key) = object.get("key") else {
        return eval_group(clause, metadata);
    };
    let field = key.as_str().ok_or_else(|| malformed("key is not a string", clause))?;
    let stored = metadata.get(field);

    if let Some(condition) = object.get("match") {
        let expected = condition
            .get("value")
            .ok_or_else(|| malformed("match has no value", clause))?;
        return Ok(stored.is_some_and(|actual| values_match(actual, expected)));
    }

    if let Some(range) = object.get("range") {
        let range =
            range.as_object().ok_or_else(|| malformed("range is not an object", clause))?;
        let Some(actual) = stored.and_then(Value::as_f64) else {
            return Ok(false);
        };
        for (op, bound) in range {
            let bound =
                bound.as_f64().ok_or_else(|| malformed("range bound is not numeric", clause))?;
            let holds = match op.as_str() {
                "gt" => actual > bound,
                "lt" => actual < bound,
                "gte" => actual >= bound,
                "lte" => actual <= bound,
                _ => return Err(malformed("unknown range operator", clause)),
            };
            if !holds {
                return Ok(false);
            }
        }
        return Ok(true);
    }

    Err(malformed("leaf has neither match nor range", clause))
}

/// Scalar equality, with array-valued metadata matching on membership.
fn values_match(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| scalar_eq(item, expected)),
        _ => scalar_eq(actual, expected),
    }
}

fn scalar_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        // Numeric comparison so 1000 and 1000.0 compare equal.
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    async fn add_documents(&self, chunks: &[Chunk]) -> Result<()> {
        let mut store = self.chunks.write().await;
        for chunk in chunks {
            store.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn similarity_search(
        &self,
        _query: &str,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<SearchResult>> {
        let store = self.chunks.read().await;

        let mut scored = Vec::new();
        for chunk in store.values() {
            if let Some(filter) = filter {
                if !eval_group(filter, &chunk.metadata)? {
                    continue;
                }
            }
            let score = cosine_similarity(&chunk.embedding, query_embedding);
            scored.push(SearchResult { chunk: chunk.clone(), score });
        }

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_documents(&self, ids: &[&str]) -> Result<()> {
        let mut store = self.chunks.write().await;
        for id in ids {
            store.remove(*id);
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }

    fn dialect(&self) -> DialectKind {
        DialectKind::PointMatch
    }
}
