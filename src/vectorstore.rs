//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;
use serde_json::Value;

use crate::dialect::DialectKind;
use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A similarity-search backend, treated as an opaque capability.
///
/// The retrieval core never looks inside a store: it hands over chunks,
/// a query embedding, and a filter pre-compiled for the store's declared
/// [`dialect`](VectorStore::dialect), and gets ranked hits back. Store
/// failures propagate to the caller unmodified — this core performs no
/// retries.
///
/// Adding a new backend means implementing this trait and, if the
/// backend speaks a query dialect the crate does not know yet, one new
/// [`QueryDialect`](crate::dialect::QueryDialect) renderer. Nothing else
/// changes.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Prepare the backend for use (create collections, open connections).
    /// Must be idempotent.
    async fn initialize(&self) -> Result<()>;

    /// Store chunks. Chunks must have embeddings set.
    async fn add_documents(&self, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` chunks most similar to the query embedding,
    /// restricted to chunks matching `filter` when one is given.
    ///
    /// `filter` is already compiled for this store's dialect. `query` is
    /// the original query text, available to backends that blend lexical
    /// signals into their ranking. Returns results ordered by descending
    /// similarity score.
    async fn similarity_search(
        &self,
        query: &str,
        query_embedding: &[f32],
        top_k: usize,
        filter: Option<&Value>,
    ) -> Result<Vec<SearchResult>>;

    /// Delete chunks by their IDs.
    async fn delete_documents(&self, ids: &[&str]) -> Result<()>;

    /// Release backend resources. Must be safe to call more than once.
    async fn close(&self) -> Result<()>;

    /// The query dialect this store's filters must be compiled into.
    fn dialect(&self) -> DialectKind;
}
