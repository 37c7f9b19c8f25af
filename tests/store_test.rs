mod helpers;

use std::sync::Arc;

use helpers::{hashed, temp_store, unit, TableEmbedder};
use hipai::store::{StoreError, VectorStore, MAX_N_RESULTS};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn open_creates_nested_directories() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("a").join("b").join("memory.db");

    let store = VectorStore::open(&path, hashed()).unwrap();
    store.create_collection("memories").unwrap();

    assert!(path.exists());
}

#[test]
fn upsert_overwrites_same_id() {
    let (_dir, path) = temp_store();
    let store = VectorStore::open(&path, hashed()).unwrap();
    let collection = store.create_collection("memories").unwrap();

    collection
        .upsert(&strings(&["fact"]), &strings(&["User likes tea"]))
        .unwrap();
    collection
        .upsert(&strings(&["fact"]), &strings(&["User likes green tea"]))
        .unwrap();

    assert_eq!(collection.name(), "memories");
    assert_eq!(collection.count().unwrap(), 1);
    let result = collection.query(&strings(&["tea"]), 5).unwrap();
    assert_eq!(result.documents, vec![strings(&["User likes green tea"])]);
}

#[test]
fn query_is_ranked_and_capped() {
    let (_dir, path) = temp_store();
    let embedder = Arc::new(TableEmbedder::new(&[
        ("north", unit(&[(0, 1.0)])),
        ("east", unit(&[(1, 1.0)])),
        ("n1", unit(&[(0, 1.0), (1, 0.05)])),
        ("n2", unit(&[(0, 1.0), (1, 0.5)])),
        ("e1", unit(&[(1, 1.0), (0, 0.05)])),
    ]));
    let store = VectorStore::open(&path, embedder).unwrap();
    let collection = store.create_collection("memories").unwrap();
    collection
        .upsert(&strings(&["e1", "n2", "n1"]), &strings(&["e1", "n2", "n1"]))
        .unwrap();

    let result = collection.query(&strings(&["north", "east"]), 2).unwrap();
    assert_eq!(result.ids.len(), 2);
    assert_eq!(result.ids[0], strings(&["n1", "n2"]));
    assert_eq!(result.ids[1][0], "e1");
    assert_eq!(result.ids[1].len(), 2);
    assert!(result.distances[0][0] <= result.distances[0][1]);

    let hits = result.hits(0);
    assert_eq!(hits[0].document, "n1");
    assert!(result.hits(5).is_empty());
}

#[test]
fn query_with_zero_results_is_empty() {
    let store = VectorStore::open_in_memory(hashed()).unwrap();
    let collection = store.create_collection("memories").unwrap();
    collection
        .upsert(&strings(&["x"]), &strings(&["something"]))
        .unwrap();

    let result = collection.query(&strings(&["something"]), 0).unwrap();
    assert_eq!(result.ids, vec![Vec::<String>::new()]);
}

#[test]
fn oversized_n_results_is_clamped() {
    let store = VectorStore::open_in_memory(hashed()).unwrap();
    let collection = store.create_collection("memories").unwrap();
    collection
        .upsert(&strings(&["a", "b"]), &strings(&["alpha", "beta"]))
        .unwrap();

    let result = collection
        .query(&strings(&["alpha"]), MAX_N_RESULTS + 904)
        .unwrap();
    assert_eq!(result.ids[0].len(), 2);
    assert_eq!(result.ids[0][0], "a");
}

#[test]
fn mismatched_lengths_are_rejected() {
    let store = VectorStore::open_in_memory(hashed()).unwrap();
    let collection = store.create_collection("memories").unwrap();

    let err = collection
        .upsert(&strings(&["a", "b"]), &strings(&["only one"]))
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::LengthMismatch {
            ids: 2,
            documents: 1
        }
    ));
    assert_eq!(collection.count().unwrap(), 0);
}

#[test]
fn collections_are_isolated() {
    let store = VectorStore::open_in_memory(hashed()).unwrap();
    store
        .create_collection("memories")
        .unwrap()
        .upsert(&strings(&["1", "2"]), &strings(&["one", "two"]))
        .unwrap();
    store
        .create_collection("articles")
        .unwrap()
        .upsert(&strings(&["doc:0"]), &strings(&["chunk"]))
        .unwrap();

    let infos = store.list_collections().unwrap();
    let summary: Vec<(&str, usize)> = infos.iter().map(|i| (i.name.as_str(), i.count)).collect();
    assert_eq!(summary, vec![("articles", 1), ("memories", 2)]);

    let hits = store
        .get_collection("articles")
        .unwrap()
        .query(&strings(&["one"]), 10)
        .unwrap()
        .hits(0);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "doc:0");
}

#[test]
fn unknown_collection_is_not_found() {
    let (_dir, path) = temp_store();
    let store = VectorStore::open(&path, hashed()).unwrap();
    assert!(matches!(
        store.get_collection("nope"),
        Err(StoreError::CollectionNotFound(name)) if name == "nope"
    ));
}

#[test]
fn file_store_uses_wal() {
    let (_dir, path) = temp_store();
    VectorStore::open(&path, hashed()).unwrap();

    let conn = rusqlite::Connection::open(&path).unwrap();
    let mode: String = conn
        .query_row("PRAGMA journal_mode", [], |row| row.get(0))
        .unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
}
