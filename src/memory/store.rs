//! Write path: record ids and document chunking.
//!
//! Memories are keyed by a SHA-256 digest of their text, so storing the same
//! fact twice overwrites one record. Chunked documents use
//! `"<doc-id>:<chunk-index>"` ids so search can group chunks by document.

use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of the text. Stable across processes and restarts.
pub fn content_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

pub fn chunk_id(doc_id: &str, index: usize) -> String {
    format!("{doc_id}:{index}")
}

/// Split text into windows of at most `max_words` whitespace-separated words.
///
/// Whitespace inside a chunk is normalized to single spaces. Text with no
/// words yields no chunks.
pub fn chunk_text(text: &str, max_words: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(max_words.max(1))
        .map(|chunk| chunk.join(" "))
        .collect()
}

/// A document id is usable if it is non-empty and has no `:`, which would
/// shift the source/chunk boundary.
pub fn valid_document_id(doc_id: &str) -> bool {
    !doc_id.is_empty() && !doc_id.contains(':')
}
