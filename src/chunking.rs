//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`RecursiveChunker`] — splits hierarchically along a prioritized
//!   separator list with configurable overlap
//! - [`FixedSizeChunker`] — splits by character count with configurable overlap
//!
//! Both are pure functions of their input: the same document always
//! produces the same chunks, and no shared state is touched, so chunkers
//! are safe to call from any number of concurrent tasks.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata but no embeddings.
/// Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    /// Each returned chunk has an empty embedding vector.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Build a [`Chunk`] from a piece of text at the given index, inheriting
/// the parent document's metadata plus a `chunk_index` field.
fn make_chunk(document: &Document, index: usize, text: String) -> Chunk {
    let mut metadata = document.metadata.clone();
    metadata.insert("chunk_index".to_string(), serde_json::Value::from(index));
    Chunk {
        id: format!("{}_{index}", document.id),
        text,
        embedding: Vec::new(),
        metadata,
        chunk_index: index,
        document_id: document.id.clone(),
    }
}

/// Splits text hierarchically along a prioritized separator list.
///
/// The splitter picks the first separator that occurs in the current span
/// (falling back to the last one, conventionally the empty string meaning
/// "atomic, no further splitting"), splits on it, and greedily packs the
/// trimmed pieces back together up to `chunk_size` characters. Pieces
/// that are individually oversized are re-split with the remaining,
/// finer-grained separators. A span with no usable separator is emitted
/// as a single oversized chunk rather than cut mid-token.
///
/// After splitting, each chunk except the first is prefixed with the last
/// `chunk_overlap` characters of its predecessor plus a joining space.
/// The prefix is prepended as-is, so overlapped chunks may exceed
/// `chunk_size` by up to `chunk_overlap + 1` characters.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(512, 100);
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker` with the default separator list
    /// (paragraph break, line break, space, empty string).
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk (before overlap)
    /// * `chunk_overlap` — number of trailing characters of each chunk
    ///   prepended to its successor
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self::with_separators(chunk_size, chunk_overlap, ["\n\n", "\n", " ", ""])
    }

    /// Create a new `RecursiveChunker` with a custom separator priority list.
    ///
    /// The last separator is the fallback when none of the others occur;
    /// an empty string there means "treat the span as atomic."
    pub fn with_separators<I, S>(chunk_size: usize, chunk_overlap: usize, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunk_size,
            chunk_overlap,
            separators: separators.into_iter().map(Into::into).collect(),
        }
    }

    /// Split raw text into chunk strings, without overlap applied.
    fn split(&self, text: &str) -> Vec<String> {
        let separators: Vec<&str> = self.separators.iter().map(String::as_str).collect();
        split_with_separators(text, self.chunk_size, &separators)
    }
}

/// Recursive split-and-pack over a separator priority list.
fn split_with_separators(text: &str, chunk_size: usize, separators: &[&str]) -> Vec<String> {
    if text.is_empty() || separators.is_empty() {
        return Vec::new();
    }

    // First separator that actually occurs wins; the empty string
    // trivially occurs everywhere, so an interior "" is selected the
    // moment the scan reaches it. Otherwise fall back to the last one
    // in the list.
    let (sep_index, separator) = separators
        .iter()
        .enumerate()
        .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
        .map(|(i, sep)| (i, *sep))
        .unwrap_or((separators.len() - 1, separators[separators.len() - 1]));

    // An empty separator means the span is atomic.
    let pieces: Vec<&str> = if separator.is_empty() {
        vec![text]
    } else {
        text.split(separator).collect()
    };
    let deeper = &separators[sep_index + 1..];

    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }

        let piece_len = piece.chars().count();
        let joined_len = if current.is_empty() {
            piece_len
        } else {
            current.chars().count() + separator.chars().count() + piece_len
        };

        if joined_len <= chunk_size {
            if !current.is_empty() {
                current.push_str(separator);
            }
            current.push_str(piece);
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if piece_len > chunk_size && !deeper.is_empty() {
            chunks.extend(split_with_separators(piece, chunk_size, deeper));
        } else {
            // Oversized atomic token: emitted unsplit once flushed.
            current = piece.to_string();
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Return the last `n` characters of `text`.
fn char_suffix(text: &str, n: usize) -> &str {
    let total = text.chars().count();
    let skip = total.saturating_sub(n);
    match text.char_indices().nth(skip) {
        Some((byte_offset, _)) => &text[byte_offset..],
        None => "",
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let raw = self.split(&document.text);

        let mut chunks = Vec::with_capacity(raw.len());
        for (i, text) in raw.iter().enumerate() {
            let text = if i == 0 || self.chunk_overlap == 0 {
                text.clone()
            } else {
                format!("{} {text}", char_suffix(&raw[i - 1], self.chunk_overlap))
            };
            chunks.push(make_chunk(document, i, text));
        }

        chunks
    }
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// The window advances by `chunk_size - chunk_overlap` characters per step,
/// so `chunk_overlap >= chunk_size` would never advance; the constructor
/// rejects that configuration outright.
///
/// # Example
///
/// ```rust,ignore
/// use ragkit::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size` (a non-advancing window).
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let stride = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut index = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();
            chunks.push(make_chunk(document, index, text));
            index += 1;
            start += stride;
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> Document {
        Document::with_id("doc", text)
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        let recursive = RecursiveChunker::new(100, 10);
        assert!(recursive.chunk(&doc("")).is_empty());

        let fixed = FixedSizeChunker::new(100, 10).unwrap();
        assert!(fixed.chunk(&doc("")).is_empty());
    }

    #[test]
    fn atomic_token_is_emitted_oversized_and_unsplit() {
        let input = "thisisalongwordthatcannotbesplit";
        assert_eq!(input.len(), 32);

        let chunker = RecursiveChunker::with_separators(10, 0, [" ", ""]);
        let chunks = chunker.chunk(&doc(input));

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, input);
    }

    #[test]
    fn recursive_chunks_respect_size_plus_overlap_slack() {
        let text = "The quick brown fox jumps over the lazy dog. \
                    Pack my box with five dozen liquor jugs. \
                    How vexingly quick daft zebras jump. \
                    Sphinx of black quartz, judge my vow.";
        let chunker = RecursiveChunker::new(50, 10);
        let chunks = chunker.chunk(&doc(text));

        assert!(!chunks.is_empty());
        for chunk in &chunks {
            // size + overlap + joining space
            assert!(chunk.text.chars().count() <= 61, "oversized chunk: {:?}", chunk.text);
        }
    }

    #[test]
    fn recursive_concatenation_preserves_content() {
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunker = RecursiveChunker::new(20, 0);
        let chunks = chunker.chunk(&doc(text));

        let rejoined: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        assert_eq!(rejoined.join(" "), text);
    }

    #[test]
    fn recursive_overlap_prepends_previous_suffix() {
        let text = "one two three four five six seven eight nine ten";
        let chunker = RecursiveChunker::new(15, 5);
        let chunks = chunker.chunk(&doc(text));

        assert!(chunks.len() > 1);
        let no_overlap = RecursiveChunker::new(15, 0).chunk(&doc(text));
        for i in 1..chunks.len() {
            let suffix = char_suffix(&no_overlap[i - 1].text, 5);
            assert!(chunks[i].text.starts_with(&format!("{suffix} ")));
        }
    }

    #[test]
    fn recursive_prefers_paragraph_breaks() {
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunker = RecursiveChunker::new(25, 0);
        let chunks = chunker.chunk(&doc(text));

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "first paragraph here");
        assert_eq!(chunks[1].text, "second paragraph here");
    }

    #[test]
    fn interior_empty_separator_is_selected_when_reached() {
        // "" ahead of " " makes a fitting span atomic: the raw text is
        // kept verbatim instead of being split and rejoined on spaces.
        let chunker = RecursiveChunker::with_separators(20, 0, ["", " "]);
        let chunks = chunker.chunk(&doc("alpha  beta"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha  beta");

        // An oversized span still recurses into the deeper separators.
        let chunker = RecursiveChunker::with_separators(5, 0, ["", " "]);
        let chunks = chunker.chunk(&doc("aa bb cc"));
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["aa bb", "cc"]);
    }

    #[test]
    fn chunk_ids_and_indices_follow_document() {
        let chunker = RecursiveChunker::new(10, 0);
        let chunks = chunker.chunk(&doc("alpha beta gamma delta"));

        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.id, format!("doc_{i}"));
            assert_eq!(chunk.document_id, "doc");
            assert_eq!(chunk.metadata["chunk_index"], serde_json::Value::from(i));
        }
    }

    #[test]
    fn fixed_size_windows_overlap() {
        let text = "a".repeat(50);
        let chunker = FixedSizeChunker::new(10, 2).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 10);
        }
        for pair in chunks.windows(2) {
            if pair[1].text.chars().count() >= 2 {
                assert_eq!(char_suffix(&pair[0].text, 2), &pair[1].text[..2]);
            }
        }
    }

    #[test]
    fn fixed_size_rejects_non_advancing_window() {
        assert!(matches!(FixedSizeChunker::new(10, 10), Err(RagError::ConfigError(_))));
        assert!(matches!(FixedSizeChunker::new(10, 12), Err(RagError::ConfigError(_))));
        assert!(matches!(FixedSizeChunker::new(0, 0), Err(RagError::ConfigError(_))));
    }
}
