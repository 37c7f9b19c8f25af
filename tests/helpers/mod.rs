#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use hipai::embedding::hashed::HashedEmbeddingProvider;
use hipai::embedding::{EmbeddingProvider, EMBEDDING_DIM};
use hipai::memory::{MemoryRepository, SearchMode};
use hipai::store::VectorStore;
use tempfile::TempDir;

/// Unit vector built from `(dimension, weight)` pairs.
pub fn unit(components: &[(usize, f32)]) -> Vec<f32> {
    let mut v = vec![0.0f32; EMBEDDING_DIM];
    for &(dim, weight) in components {
        v[dim] += weight;
    }
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter_mut().for_each(|x| *x /= norm);
    v
}

/// Embedder with hand-placed vectors for known texts, so tests control the
/// ranking exactly. Unknown texts fall back to token hashing. Any text
/// containing `fail_on` makes the whole call fail.
pub struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
    fallback: HashedEmbeddingProvider,
    fail_on: Option<String>,
}

impl TableEmbedder {
    pub fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, v)| (text.to_string(), v.clone()))
                .collect(),
            fallback: HashedEmbeddingProvider::new(EMBEDDING_DIM),
            fail_on: None,
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on = Some(marker.to_string());
        self
    }
}

impl EmbeddingProvider for TableEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(marker) = &self.fail_on {
            anyhow::ensure!(!text.contains(marker.as_str()), "refusing to embed {text:?}");
        }
        match self.table.get(text) {
            Some(v) => Ok(v.clone()),
            None => self.fallback.embed(text),
        }
    }

    fn model_id(&self) -> &str {
        "test-table"
    }
}

/// A temp store path; the directory lives as long as the returned guard.
pub fn temp_store() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.db");
    (dir, path)
}

/// Repository over a fresh store with the collection already created.
pub fn repository(
    path: &PathBuf,
    mode: SearchMode,
    embedder: Arc<dyn EmbeddingProvider>,
) -> MemoryRepository {
    let repo = MemoryRepository::new(path.clone(), "memories", embedder).with_mode(mode);
    repo.ensure_collection().unwrap();
    repo
}

pub fn hashed() -> Arc<dyn EmbeddingProvider> {
    Arc::new(HashedEmbeddingProvider::new(EMBEDDING_DIM))
}

/// Number of records in the `memories` collection.
pub fn record_count(path: &PathBuf, embedder: Arc<dyn EmbeddingProvider>) -> usize {
    let store = VectorStore::open(path, embedder).unwrap();
    let count = store.get_collection("memories").unwrap().count().unwrap();
    count
}
