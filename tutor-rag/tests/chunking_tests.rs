//! Property tests for the boundary chunker: size cap, exact overlap, and
//! lossless reconstruction.

use std::collections::HashMap;

use proptest::prelude::*;
use tutor_rag::chunking::{BoundaryChunker, Chunker};
use tutor_rag::document::Document;

fn doc(text: &str) -> Document {
    Document { id: "doc".to_string(), text: text.to_string(), metadata: HashMap::new() }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Concatenating fragments with each non-initial fragment's leading
    /// overlap removed reproduces the source text byte for byte.
    #[test]
    fn reconstruction_is_lossless(
        text in "[a-zA-Z0-9 .!?\n]{0,400}",
        size in 8usize..60,
        overlap in 0usize..7,
    ) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        if text.is_empty() {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }

        let mut rebuilt = chunks[0].text.clone();
        for chunk in &chunks[1..] {
            rebuilt.push_str(&chunk.text[overlap..]);
        }
        prop_assert_eq!(rebuilt, text);
    }

    /// No fragment exceeds the configured size, and every fragment is
    /// non-empty.
    #[test]
    fn fragments_respect_the_size_cap(
        text in "[a-zA-Z0-9 .!?\n]{1,400}",
        size in 8usize..60,
        overlap in 0usize..7,
    ) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        for chunk in chunker.chunk(&doc(&text)) {
            prop_assert!(!chunk.text.is_empty());
            prop_assert!(
                chunk.text.len() <= size,
                "fragment of {} bytes exceeds cap {}", chunk.text.len(), size
            );
        }
    }

    /// Consecutive fragments of one document share exactly the configured
    /// overlap: the first fragment's tail equals the second's head.
    #[test]
    fn consecutive_fragments_share_the_exact_overlap(
        text in "[a-zA-Z0-9 .!?\n]{1,400}",
        size in 8usize..60,
        overlap in 1usize..7,
    ) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        for pair in chunks.windows(2) {
            let tail = &pair[0].text[pair[0].text.len() - overlap..];
            let head = &pair[1].text[..overlap];
            prop_assert_eq!(tail, head);
        }
    }

    /// Fragment indices are consecutive from zero and ids embed them.
    #[test]
    fn fragment_ids_and_indices_are_sequential(
        text in "[a-zA-Z0-9 .!?\n]{1,400}",
    ) {
        let chunker = BoundaryChunker::new(24, 4).unwrap();
        for (i, chunk) in chunker.chunk(&doc(&text)).iter().enumerate() {
            prop_assert_eq!(chunk.chunk_index, i);
            prop_assert_eq!(&chunk.id, &format!("doc_{i}"));
            prop_assert_eq!(&chunk.document_id, "doc");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Multibyte text with a narrow size/overlap gap must always
    /// terminate and must never drop text, even when the exact-overlap
    /// guarantee has to be relaxed to keep the window advancing.
    #[test]
    fn multibyte_chunking_terminates_without_losing_text(
        text in "[🎉é日aß ]{0,40}",
        size in 4usize..9,
        overlap in 0usize..4,
    ) {
        let chunker = BoundaryChunker::new(size, overlap).unwrap();
        let chunks = chunker.chunk(&doc(&text));

        if text.is_empty() {
            prop_assert!(chunks.is_empty());
            return Ok(());
        }

        prop_assert!(text.starts_with(&chunks[0].text));
        prop_assert!(text.ends_with(&chunks[chunks.len() - 1].text));
        let total: usize = chunks.iter().map(|c| c.text.len()).sum();
        prop_assert!(total >= text.len(), "fragments cover fewer bytes than the input");
        for chunk in &chunks {
            prop_assert!(!chunk.text.is_empty());
            prop_assert!(text.contains(&chunk.text));
        }
    }
}

/// Four-byte characters with a 2-byte advance gap leave no char boundary
/// inside the overlap window; the chunker must step forward anyway.
#[test]
fn multibyte_with_narrow_advance_gap_terminates() {
    let chunker = BoundaryChunker::new(5, 3).unwrap();
    let chunks = chunker.chunk(&doc("🎉🎉🎉"));

    let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(rebuilt, "🎉🎉🎉");
    assert_eq!(chunks.len(), 3);
}

/// A floored window shorter than the overlap must not underflow the
/// next-start arithmetic.
#[test]
fn window_shorter_than_overlap_does_not_underflow() {
    let chunker = BoundaryChunker::new(4, 3).unwrap();
    let chunks = chunker.chunk(&doc("a🎉"));

    let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(rebuilt, "a🎉");
}

/// A single character wider than the cap becomes one oversized fragment
/// instead of an error or a stall.
#[test]
fn single_char_wider_than_cap_is_its_own_fragment() {
    let chunker = BoundaryChunker::new(3, 1).unwrap();
    let chunks = chunker.chunk(&doc("🎉"));
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].text, "🎉");
}

/// Multibyte input never splits inside a character; the cap still holds.
#[test]
fn multibyte_text_never_panics_and_stays_capped() {
    let text = "Из чего состоит клетка? Ядро и мембрана. 光合作用 needs light. ".repeat(8);
    let chunker = BoundaryChunker::new(40, 6).unwrap();
    let chunks = chunker.chunk(&doc(&text));

    assert!(!chunks.is_empty());
    for chunk in &chunks {
        assert!(chunk.text.len() <= 40);
    }
}
