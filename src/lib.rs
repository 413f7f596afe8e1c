//! In-process retrieval core for document search and RAG pipelines.
//!
//! This crate provides:
//! - Document chunking ([`RecursiveChunker`], [`FixedSizeChunker`])
//! - Backend-agnostic query filters ([`Filter`]) compiled into concrete
//!   store dialects ([`PointMatchDialect`], [`BoolQueryDialect`])
//! - Result reranking ([`KeywordReranker`], [`RrfReranker`], [`NoOpReranker`])
//! - TTL-bounded result caching ([`QueryCache`])
//! - The [`Retriever`] orchestrator composing all of the above over
//!   pluggable [`EmbeddingProvider`] and [`VectorStore`] capabilities
//!
//! The similarity-search engines and embedding models themselves live
//! behind the capability traits; [`InMemoryVectorStore`] is the built-in
//! development and testing backend.

pub mod cache;
pub mod chunking;
pub mod config;
pub mod dialect;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod inmemory;
pub mod reranker;
pub mod retriever;
pub mod vectorstore;

pub use cache::QueryCache;
pub use chunking::{Chunker, FixedSizeChunker, RecursiveChunker};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use dialect::{
    compile, BoolQueryDialect, CompiledGroup, DialectKind, PointMatchDialect, QueryDialect,
    RangeOp,
};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filter::{Filter, FilterValue};
pub use inmemory::InMemoryVectorStore;
pub use reranker::{KeywordReranker, NoOpReranker, Reranker, RrfReranker};
pub use retriever::{Retriever, RetrieverBuilder, RetrieveRequest};
pub use vectorstore::VectorStore;
