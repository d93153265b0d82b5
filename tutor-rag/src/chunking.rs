//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`BoundaryChunker`], a
//! windowed splitter that prefers natural boundaries while guaranteeing a
//! hard size cap and an exact overlap between consecutive fragments.

use crate::document::{Chunk, Document, META_CHUNK_INDEX, META_CHUNK_SIZE};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into fragments.
///
/// Implementations produce [`Chunk`]s with text and metadata but no
/// embeddings. Embeddings are attached later by the pipeline. Chunking is
/// a pure function of the document text and the chunker's parameters.
pub trait Chunker: Send + Sync {
    /// Split a document into fragments.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Boundary levels tried in priority order inside each window: paragraph
/// break, line break, sentence end, plain space. Mid-token splitting is
/// the last resort.
const BOUNDARY_LEVELS: &[&[&str]] = &[&["\n\n"], &["\n"], &[". ", "! ", "? "], &[" "]];

/// Splits text into overlapping fragments of at most `chunk_size` bytes.
///
/// Each window ends at the latest natural boundary that still leaves room
/// for the next fragment to advance; when no such boundary exists the
/// window is cut at the hard cap. Consecutive fragments of one document
/// overlap by exactly `chunk_overlap` bytes (clamped to UTF-8 character
/// boundaries), so concatenating the fragments with each non-initial
/// fragment's leading overlap dropped reconstructs the input exactly.
/// The final fragment may be an undersized remainder.
///
/// Multibyte edge cases relax the byte guarantees without ever losing
/// text: a single character wider than `chunk_size` becomes its own
/// oversized fragment, and when no character boundary falls inside the
/// overlap gap the next window starts one character later with a smaller
/// overlap instead of stalling.
///
/// Fragment ids are `{document_id}_{index}`. Each fragment inherits the
/// parent document's metadata plus `chunk_index` and `chunk_size` fields.
///
/// # Example
///
/// ```rust,ignore
/// use tutor_rag::BoundaryChunker;
///
/// let chunker = BoundaryChunker::new(500, 50)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct BoundaryChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl BoundaryChunker {
    /// Create a new `BoundaryChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] when `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Compute the `[start, end)` byte spans of all fragments.
    fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        if text.is_empty() {
            return Vec::new();
        }

        let len = text.len();
        let mut spans = Vec::new();
        let mut start = 0;

        loop {
            let mut hard_end = floor_char_boundary(text, (start + self.chunk_size).min(len));
            if hard_end <= start {
                // A single character wider than the cap; split after it.
                hard_end = ceil_char_boundary(text, start + 1);
            }
            if hard_end >= len {
                spans.push((start, len));
                break;
            }

            let end = natural_boundary(&text[start..hard_end], self.chunk_overlap)
                .map(|rel| start + rel)
                .unwrap_or(hard_end);
            spans.push((start, end));

            // Flooring can shrink the window below the overlap, so the
            // subtraction must saturate.
            let mut next = floor_char_boundary(text, end.saturating_sub(self.chunk_overlap));
            if next <= start {
                // Multibyte text can leave no char boundary inside the
                // overlap gap; step past the current start so the window
                // always advances. The fragments then overlap by less
                // than the configured amount but never stall.
                next = ceil_char_boundary(text, start + 1);
            }
            start = next;
        }

        spans
    }
}

/// Find the rightmost natural boundary in `window`, trying each priority
/// level in turn. A boundary is only usable if it leaves the fragment
/// longer than `overlap`, so the next window start still advances.
fn natural_boundary(window: &str, overlap: usize) -> Option<usize> {
    for level in BOUNDARY_LEVELS {
        let best = level
            .iter()
            .filter_map(|sep| window.rfind(sep).map(|pos| pos + sep.len()))
            .filter(|&end| end > overlap && end < window.len())
            .max();
        if best.is_some() {
            return best;
        }
    }
    None
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

impl Chunker for BoundaryChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.spans(&document.text)
            .into_iter()
            .enumerate()
            .map(|(i, (start, end))| {
                let text = document.text[start..end].to_string();

                let mut metadata = document.metadata.clone();
                metadata.insert(META_CHUNK_INDEX.to_string(), i.to_string());
                metadata.insert(META_CHUNK_SIZE.to_string(), text.len().to_string());

                Chunk {
                    id: format!("{}_{i}", document.id),
                    text,
                    embedding: Vec::new(),
                    metadata,
                    document_id: document.id.clone(),
                    chunk_index: i,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn doc(text: &str) -> Document {
        Document { id: "doc".to_string(), text: text.to_string(), metadata: HashMap::new() }
    }

    #[test]
    fn empty_text_yields_no_fragments() {
        let chunker = BoundaryChunker::new(100, 10).unwrap();
        assert!(chunker.chunk(&doc("")).is_empty());
    }

    #[test]
    fn short_text_yields_one_fragment() {
        let chunker = BoundaryChunker::new(100, 10).unwrap();
        let chunks = chunker.chunk(&doc("short"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "short");
        assert_eq!(chunks[0].id, "doc_0");
    }

    #[test]
    fn overlap_must_be_less_than_size() {
        assert!(matches!(BoundaryChunker::new(10, 10), Err(RagError::Config(_))));
        assert!(matches!(BoundaryChunker::new(0, 0), Err(RagError::Config(_))));
    }

    #[test]
    fn paragraph_break_is_preferred_over_space() {
        let text = "first paragraph here\n\nsecond paragraph continues with more words";
        let chunker = BoundaryChunker::new(30, 4).unwrap();
        let chunks = chunker.chunk(&doc(text));
        assert_eq!(chunks[0].text, "first paragraph here\n\n");
    }

    #[test]
    fn consecutive_fragments_overlap_exactly() {
        let text = "Photosynthesis converts light into chemical energy.";
        let chunker = BoundaryChunker::new(20, 5).unwrap();
        let chunks = chunker.chunk(&doc(text));

        assert!(chunks.len() > 1);
        for pair in chunks.windows(2) {
            let tail = &pair[0].text[pair[0].text.len() - 5..];
            assert!(pair[1].text.starts_with(tail), "overlap broken between fragments");
        }
    }

    #[test]
    fn fragments_reconstruct_the_source() {
        let text = "Photosynthesis converts light into chemical energy.";
        let chunker = BoundaryChunker::new(20, 5).unwrap();
        let chunks = chunker.chunk(&doc(text));

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.push_str(&chunk.text[5..]);
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn fragment_metadata_records_index_and_size() {
        let mut metadata = HashMap::new();
        metadata.insert("file_name".to_string(), "notes.txt".to_string());
        let document = Document {
            id: "d1".to_string(),
            text: "alpha beta gamma delta epsilon zeta".to_string(),
            metadata,
        };

        let chunker = BoundaryChunker::new(12, 3).unwrap();
        let chunks = chunker.chunk(&document);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.metadata.get(META_CHUNK_INDEX).unwrap(), &i.to_string());
            assert_eq!(
                chunk.metadata.get(META_CHUNK_SIZE).unwrap(),
                &chunk.text.len().to_string()
            );
            assert_eq!(chunk.metadata.get("file_name").unwrap(), "notes.txt");
        }
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "αβγδε ζηθικ λμνξο πρστυ φχψω end";
        let chunker = BoundaryChunker::new(16, 4).unwrap();
        let chunks = chunker.chunk(&doc(text));
        for chunk in &chunks {
            assert!(chunk.text.len() <= 16);
            assert!(chunk.text.is_char_boundary(0));
        }
    }
}
