mod helpers;

use std::sync::Arc;

use helpers::{hashed, repository, temp_store, unit, TableEmbedder};
use hipai::embedding::EmbeddingProvider;
use hipai::memory::{MemoryError, SearchMode};
use hipai::store::VectorStore;

/// Three chunks from two documents; "query" ranks them a:0, a:1, b:0.
fn corpus_embedder() -> Arc<dyn EmbeddingProvider> {
    Arc::new(TableEmbedder::new(&[
        ("query", unit(&[(0, 1.0)])),
        ("Result A", unit(&[(0, 1.0)])),
        ("Result A continued", unit(&[(0, 0.95), (1, 0.31)])),
        ("Result B", unit(&[(0, 0.7), (2, 0.71)])),
    ]))
}

fn store_chunks(path: &std::path::Path, embedder: Arc<dyn EmbeddingProvider>, chunks: &[(&str, &str)]) {
    let store = VectorStore::open(path, embedder).unwrap();
    let collection = store.create_collection("memories").unwrap();
    let ids: Vec<String> = chunks.iter().map(|(id, _)| id.to_string()).collect();
    let docs: Vec<String> = chunks.iter().map(|(_, doc)| doc.to_string()).collect();
    collection.upsert(&ids, &docs).unwrap();
}

#[test]
fn best_chunk_per_article() {
    let (_dir, path) = temp_store();
    let embedder = corpus_embedder();
    store_chunks(
        &path,
        Arc::clone(&embedder),
        &[("a:0", "Result A"), ("a:1", "Result A continued"), ("b:0", "Result B")],
    );
    let repo = repository(&path, SearchMode::Chunked, embedder);

    let hits = repo.search_hits("query", None).unwrap();
    let ranked: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(ranked, vec!["a:0", "a:1", "b:0"]);

    let out = repo.search_memories("query", None).unwrap();
    assert_eq!(out, "Relevant research articles:\n\nResult A\nResult B\n");
    let body: Vec<&str> = out.lines().skip(2).collect();
    assert_eq!(body, vec!["Result A", "Result B"]);
}

#[test]
fn dedup_holds_for_any_k() {
    let (_dir, path) = temp_store();
    let embedder = corpus_embedder();
    store_chunks(
        &path,
        Arc::clone(&embedder),
        &[("d1:0", "Result A"), ("d1:1", "Result A continued"), ("d2:0", "Result B")],
    );
    let repo = repository(&path, SearchMode::Chunked, embedder);

    for k in [3, 10, 50] {
        assert_eq!(
            repo.search_memories("query", Some(k)).unwrap(),
            "Relevant research articles:\n\nResult A\nResult B\n",
            "k = {k}"
        );
    }
    // k = 2 only reaches the two d1 chunks
    assert_eq!(
        repo.search_memories("query", Some(2)).unwrap(),
        "Relevant research articles:\n\nResult A\n"
    );
}

#[test]
fn plain_mode_does_not_deduplicate_chunks() {
    let (_dir, path) = temp_store();
    let embedder = corpus_embedder();
    store_chunks(
        &path,
        Arc::clone(&embedder),
        &[("a:0", "Result A"), ("a:1", "Result A continued"), ("b:0", "Result B")],
    );
    let repo = repository(&path, SearchMode::Plain, embedder);

    assert_eq!(
        repo.search_memories("query", None).unwrap(),
        "Result A\nResult A continued\nResult B\n"
    );
}

#[test]
fn empty_chunked_search_is_header_only() {
    let (_dir, path) = temp_store();
    let repo = repository(&path, SearchMode::Chunked, hashed());
    assert_eq!(
        repo.search_memories("anything", None).unwrap(),
        "Relevant research articles:\n\n"
    );
}

#[test]
fn ingested_document_is_one_search_result() {
    let (_dir, path) = temp_store();
    let repo = repository(&path, SearchMode::Chunked, hashed());

    let article = "rust ownership borrowing lifetimes ".repeat(10);
    let chunks = repo.add_document("rust-book", &article, 8).unwrap();
    assert_eq!(chunks, 5);
    repo.add_document("gardening", "tomatoes need sun and water", 8)
        .unwrap();

    let hits = repo.search_hits("rust ownership", None).unwrap();
    assert_eq!(hits.len(), 6);
    assert!(hits.iter().any(|h| h.id == "rust-book:0"));
    assert!(hits.iter().any(|h| h.id == "gardening:0"));

    let out = repo.search_memories("rust ownership", None).unwrap();
    assert_eq!(out.lines().count(), 2 + 2);
}

#[test]
fn reingesting_overwrites_chunks() {
    let (_dir, path) = temp_store();
    let repo = repository(&path, SearchMode::Chunked, hashed());

    repo.add_document("notes", "first draft of the notes", 3).unwrap();
    repo.add_document("notes", "final version of the notes", 3).unwrap();

    let hits = repo.search_hits("notes", None).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| !h.document.contains("draft")));
}

#[test]
fn document_id_with_colon_is_rejected() {
    let (_dir, path) = temp_store();
    let repo = repository(&path, SearchMode::Chunked, hashed());

    assert!(matches!(
        repo.add_document("doi:10.1000", "text", 10),
        Err(MemoryError::InvalidDocumentId(_))
    ));
    assert!(matches!(
        repo.add_document("", "text", 10),
        Err(MemoryError::InvalidDocumentId(_))
    ));
}
