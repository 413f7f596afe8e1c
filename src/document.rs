//! Data types for documents, chunks, and search results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A source document containing text content and metadata.
///
/// Documents are immutable once handed to the pipeline. Metadata is an
/// ordered map of string keys to scalar or array-of-scalar JSON values;
/// the ordering makes serialized forms (and anything keyed on them, such
/// as retrieval cache keys) deterministic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata associated with the document.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Optional precomputed embedding for the full document text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Document {
    /// Create a document with a freshly assigned v4 UUID.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), text)
    }

    /// Create a document with an explicit identifier.
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: BTreeMap::new(), embedding: None }
    }

    /// Attach a metadata field, returning the document for chaining.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A segment of a [`Document`] with its vector embedding.
///
/// Chunk ids follow the `{document_id}_{chunk_index}` convention. Content
/// length is bounded by the chunker's configured size, except when a
/// single atomic token exceeds it (emitted oversized and unsplit) or when
/// an overlap prefix has been prepended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
    /// Key-value metadata inherited from the parent document plus chunk-specific fields.
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Zero-based position of this chunk within its source document.
    pub chunk_index: usize,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
///
/// Result lists are ordered by descending score after any ranking step;
/// consumers rely on that ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The relevance score (higher is more relevant).
    pub score: f32,
}
