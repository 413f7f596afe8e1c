//! Retrieval orchestrator.
//!
//! The [`Retriever`] composes an [`EmbeddingProvider`], a [`VectorStore`],
//! a [`Chunker`], an optional [`Reranker`], and a [`QueryCache`] into the
//! two pipeline operations: ingest (chunk → embed → store) and retrieve
//! (cache check → compile filter → search → rerank → cache write).
//!
//! # Example
//!
//! ```rust,ignore
//! use ragkit::{Retriever, RetrievalConfig, RetrieveRequest, InMemoryVectorStore, RecursiveChunker};
//!
//! let retriever = Retriever::builder()
//!     .config(RetrievalConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(RecursiveChunker::new(512, 100)))
//!     .build()?;
//!
//! retriever.ingest(&document).await?;
//! let results = retriever.retrieve(RetrieveRequest::new("search query")).await?;
//! ```

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::cache::QueryCache;
use crate::chunking::Chunker;
use crate::config::RetrievalConfig;
use crate::dialect::compile;
use crate::document::{Chunk, Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::filter::Filter;
use crate::reranker::Reranker;
use crate::vectorstore::VectorStore;

/// One retrieval request.
#[derive(Debug, Clone)]
pub struct RetrieveRequest {
    /// The query text.
    pub query: String,
    /// Number of results to return; the configured default when `None`.
    pub top_k: Option<usize>,
    /// Optional metadata filter, compiled for the store's dialect.
    pub filter: Option<Filter>,
    /// Whether to run the configured reranker on the hits.
    pub rerank: bool,
}

impl RetrieveRequest {
    /// A request with default top-k, no filter, no reranking.
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), top_k: None, filter: None, rerank: false }
    }

    /// Override the number of results to return.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Restrict results to chunks matching the filter.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Run the configured reranker on the hits.
    pub fn with_rerank(mut self) -> Self {
        self.rerank = true;
        self
    }
}

/// The retrieval pipeline orchestrator.
///
/// Stateless apart from the injected result cache; safe to share across
/// tasks behind an `Arc`. Construct one via [`Retriever::builder()`].
pub struct Retriever {
    config: RetrievalConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    reranker: Option<Arc<dyn Reranker>>,
    cache: Arc<QueryCache<Vec<SearchResult>>>,
}

impl Retriever {
    /// Create a new [`RetrieverBuilder`].
    pub fn builder() -> RetrieverBuilder {
        RetrieverBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Return a reference to the result cache.
    pub fn cache(&self) -> &Arc<QueryCache<Vec<SearchResult>>> {
        &self.cache
    }

    /// Drop all cached query results.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Returns the chunks that were stored (with embeddings attached).
    ///
    /// # Errors
    ///
    /// Embedder and store failures propagate unmodified; the caller
    /// decides retry and surfacing policy.
    pub async fn ingest(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(chunks);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
            e
        })?;

        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        self.vector_store.add_documents(&chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "store write failed during ingestion");
            e
        })?;

        info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Ingest multiple documents through the chunk → embed → store workflow.
    ///
    /// Returns all chunks that were stored across all documents; stops at
    /// the first document that fails.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<Chunk>> {
        let mut all_chunks = Vec::new();
        for document in documents {
            all_chunks.extend(self.ingest(document).await?);
        }
        Ok(all_chunks)
    }

    /// Execute one retrieval: cache check, then on a miss compile the
    /// filter once for the store's dialect, search, optionally rerank,
    /// and write the ranked results through to the cache.
    ///
    /// The reranker only runs when the request asks for it and one is
    /// configured. Results below the configured `similarity_threshold`
    /// are filtered out before caching.
    ///
    /// # Errors
    ///
    /// Embedder and store failures propagate unmodified. A filter that
    /// cannot be serialized for the cache key is a
    /// [`RagError::PipelineError`].
    pub async fn retrieve(&self, request: RetrieveRequest) -> Result<Vec<SearchResult>> {
        let top_k = request.top_k.unwrap_or(self.config.top_k);
        let key = cache_key(&request.query, top_k, request.filter.as_ref())?;

        if let Some(hit) = self.cache.get(&key).await {
            debug!(query = %request.query, result_count = hit.len(), "retrieval cache hit");
            return Ok(hit);
        }
        debug!(query = %request.query, "retrieval cache miss");

        // Compiled exactly once per call, for the store's own dialect.
        let dialect = self.vector_store.dialect();
        let compiled = request.filter.as_ref().map(|filter| compile(filter, dialect.renderer()));

        let query_embedding = self.embedding_provider.embed(&request.query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            e
        })?;

        let results = self
            .vector_store
            .similarity_search(&request.query, &query_embedding, top_k, compiled.as_ref())
            .await
            .map_err(|e| {
                error!(error = %e, "vector store search failed");
                e
            })?;

        let results = match (&self.reranker, request.rerank) {
            (Some(reranker), true) => reranker.rerank(&request.query, results).await?,
            _ => results,
        };

        let threshold = self.config.similarity_threshold;
        let results: Vec<SearchResult> =
            results.into_iter().filter(|r| r.score >= threshold).collect();

        self.cache.set(key, results.clone(), self.config.cache_ttl).await;

        info!(query = %request.query, result_count = results.len(), "retrieval completed");
        Ok(results)
    }
}

/// Derive the deterministic cache key for a (query, top-k, filter) triple.
///
/// Filter field maps are ordered, so equal filters always serialize to
/// the same text and distinct filters never collide.
fn cache_key(query: &str, top_k: usize, filter: Option<&Filter>) -> Result<String> {
    let filter = match filter {
        Some(filter) => serde_json::to_string(filter)
            .map_err(|e| RagError::PipelineError(format!("filter not serializable: {e}")))?,
        None => String::new(),
    };
    Ok(format!("{top_k}|{query}|{filter}"))
}

/// Builder for constructing a [`Retriever`].
///
/// `config`, `embedding_provider`, `vector_store`, and `chunker` are
/// required; `reranker` and `cache` are optional (a fresh empty cache is
/// created when none is injected).
#[derive(Default)]
pub struct RetrieverBuilder {
    config: Option<RetrievalConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    reranker: Option<Arc<dyn Reranker>>,
    cache: Option<Arc<QueryCache<Vec<SearchResult>>>>,
}

impl RetrieverBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set an optional reranker for post-search result reordering.
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Inject a shared result cache instead of creating a fresh one.
    pub fn cache(mut self, cache: Arc<QueryCache<Vec<SearchResult>>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the [`Retriever`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<Retriever> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::ConfigError("chunker is required".to_string()))?;

        Ok(Retriever {
            config,
            embedding_provider,
            vector_store,
            chunker,
            reranker: self.reranker,
            cache: self.cache.unwrap_or_default(),
        })
    }
}
