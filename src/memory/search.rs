//! Result shaping for `search_memories`.
//!
//! Hits come back from the collection in rank order. Plain mode prints them
//! as-is; chunked mode keeps only the first hit per source document.

use std::collections::HashSet;

use crate::store::QueryHit;

/// Header line for chunked-mode output.
pub const CHUNKED_HEADER: &str = "Relevant research articles:";

/// Grouping key of a record id: the text before the first `:`, or the whole id.
pub fn source_id(id: &str) -> &str {
    id.split_once(':').map_or(id, |(source, _)| source)
}

/// Keep the first hit of every source document, preserving rank order.
///
/// Later chunks of an already-seen document are dropped, not merged.
pub fn first_per_source(hits: &[QueryHit]) -> Vec<&QueryHit> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for hit in hits {
        if seen.insert(source_id(&hit.id)) {
            kept.push(hit);
        }
    }
    kept
}

/// One document per line, each line newline-terminated.
pub fn render_plain(hits: &[QueryHit]) -> String {
    hits.iter().map(|hit| format!("{}\n", hit.document)).collect()
}

/// Header, blank line, then the best chunk of each source document.
pub fn render_chunked(hits: &[QueryHit]) -> String {
    let mut out = format!("{CHUNKED_HEADER}\n\n");
    for hit in first_per_source(hits) {
        out.push_str(&hit.document);
        out.push('\n');
    }
    out
}
