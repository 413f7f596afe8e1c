//! Property tests for the recursive chunker's size and content contracts.

use proptest::prelude::*;
use ragkit::{Chunker, Document, RecursiveChunker};

/// Generate text made of space-separated lowercase words.
fn arb_wordy_text() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{1,12}", 1..40).prop_map(|words| words.join(" "))
}

/// *For any* non-empty word-separated text and chunk size ≥ 1, every
/// chunk is at most `chunk_size` characters unless it is a single atomic
/// token that itself exceeds the size, and rejoining the chunks
/// reconstructs the input's words in order.
mod prop_recursive_chunker {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_bounded_and_content_preserved(
            text in arb_wordy_text(),
            chunk_size in 1usize..64,
        ) {
            let chunker = RecursiveChunker::new(chunk_size, 0);
            let document = Document::with_id("doc", text.clone());
            let chunks = chunker.chunk(&document);

            prop_assert!(!chunks.is_empty());

            for chunk in &chunks {
                let len = chunk.text.chars().count();
                if len > chunk_size {
                    // Only an oversized atomic token may exceed the size.
                    prop_assert!(
                        !chunk.text.contains(' '),
                        "oversized non-atomic chunk: {:?}",
                        chunk.text,
                    );
                }
            }

            // Word sequence survives chunking intact.
            let original_words: Vec<&str> = text.split_whitespace().collect();
            let chunked_words: Vec<String> = chunks
                .iter()
                .flat_map(|c| c.text.split_whitespace().map(str::to_string))
                .collect();
            prop_assert_eq!(original_words, chunked_words);
        }

        #[test]
        fn chunking_is_deterministic(
            text in arb_wordy_text(),
            chunk_size in 1usize..64,
            overlap in 0usize..16,
        ) {
            let chunker = RecursiveChunker::new(chunk_size, overlap);
            let document = Document::with_id("doc", text);
            let first = chunker.chunk(&document);
            let second = chunker.chunk(&document);
            prop_assert_eq!(first, second);
        }
    }
}
