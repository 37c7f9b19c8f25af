//! Memory repository: the layer the tools call.
//!
//! Turns `add_memories` / `search_memories` requests into collection
//! operations. Every call opens its own store handle; the repository keeps no
//! connection, cache, or lock between calls.

pub mod search;
pub mod store;
pub mod types;

pub use types::{MemoryError, SearchMode};

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::HipaiConfig;
use crate::embedding::EmbeddingProvider;
use crate::store::{CollectionInfo, QueryHit, VectorStore};

pub type MemoryResult<T> = std::result::Result<T, MemoryError>;

pub const DEFAULT_K: usize = 10;

#[derive(Clone)]
pub struct MemoryRepository {
    store_path: PathBuf,
    collection: String,
    mode: SearchMode,
    default_k: usize,
    embedder: Arc<dyn EmbeddingProvider>,
}

impl MemoryRepository {
    pub fn new(
        store_path: impl Into<PathBuf>,
        collection: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            store_path: store_path.into(),
            collection: collection.into(),
            mode: SearchMode::Plain,
            default_k: DEFAULT_K,
            embedder,
        }
    }

    pub fn from_config(config: &HipaiConfig, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self::new(
            config.resolved_store_path(),
            config.storage.collection.clone(),
            embedder,
        )
        .with_mode(config.retrieval.mode)
        .with_default_k(config.retrieval.default_k)
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn open(&self) -> MemoryResult<VectorStore> {
        VectorStore::open(&self.store_path, Arc::clone(&self.embedder))
            .map_err(MemoryError::StorageUnavailable)
    }

    /// Create the configured collection if it does not exist yet.
    pub fn ensure_collection(&self) -> MemoryResult<()> {
        let store = self.open()?;
        if let Some(stored) = store
            .check_embedding_model()
            .map_err(MemoryError::StorageUnavailable)?
        {
            tracing::warn!(
                stored = %stored,
                configured = %self.embedder.model_id(),
                "store was built with a different embedding model; search quality will suffer"
            );
        }
        store
            .create_collection(&self.collection)
            .map_err(MemoryError::StorageUnavailable)?;
        Ok(())
    }

    /// Store each text as one record keyed by its content hash. Returns the
    /// number of distinct records written; repeated texts count once.
    ///
    /// An empty slice is a no-op. The batch is all-or-nothing: if any text
    /// fails to embed or write, none are stored.
    pub fn add_memories(&self, texts: &[String]) -> MemoryResult<usize> {
        if texts.is_empty() {
            return Ok(0);
        }
        let mut seen = HashSet::new();
        let mut ids = Vec::with_capacity(texts.len());
        let mut documents = Vec::with_capacity(texts.len());
        for text in texts {
            let id = store::content_hash(text);
            if seen.insert(id.clone()) {
                ids.push(id);
                documents.push(text.clone());
            }
        }
        self.upsert(&ids, &documents)?;
        tracing::info!(collection = %self.collection, count = ids.len(), "memories added");
        Ok(ids.len())
    }

    /// Split a document into word windows and store them as `"<doc_id>:<i>"`.
    /// Returns the number of chunks written.
    pub fn add_document(&self, doc_id: &str, text: &str, chunk_words: usize) -> MemoryResult<usize> {
        if !store::valid_document_id(doc_id) {
            return Err(MemoryError::InvalidDocumentId(doc_id.to_string()));
        }
        let chunks = store::chunk_text(text, chunk_words);
        if chunks.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = (0..chunks.len())
            .map(|i| store::chunk_id(doc_id, i))
            .collect();
        self.upsert(&ids, &chunks)?;
        tracing::info!(collection = %self.collection, doc_id, chunks = chunks.len(), "document added");
        Ok(chunks.len())
    }

    fn upsert(&self, ids: &[String], documents: &[String]) -> MemoryResult<()> {
        let store = self.open()?;
        let collection = store
            .get_collection(&self.collection)
            .map_err(MemoryError::StorageUnavailable)?;
        collection
            .upsert(ids, documents)
            .map_err(MemoryError::StorageWriteFailed)
    }

    /// Ranked hits for `query`, `k` defaulting to the configured value.
    ///
    /// The query goes to the collection unchanged, including an empty one.
    pub fn search_hits(&self, query: &str, k: Option<usize>) -> MemoryResult<Vec<QueryHit>> {
        let k = k.unwrap_or(self.default_k);
        let store = self.open()?;
        let collection = store
            .get_collection(&self.collection)
            .map_err(MemoryError::StorageUnavailable)?;
        let result = collection
            .query(&[query.to_string()], k)
            .map_err(MemoryError::StorageUnavailable)?;
        let hits = result.hits(0);
        tracing::debug!(collection = %self.collection, k, hits = hits.len(), "collection queried");
        Ok(hits)
    }

    /// Search and render the result as text for the model.
    ///
    /// Zero hits is not an error: plain mode returns `""`, chunked mode the
    /// header alone.
    pub fn search_memories(&self, query: &str, k: Option<usize>) -> MemoryResult<String> {
        let hits = self.search_hits(query, k)?;
        Ok(self.render(&hits))
    }

    /// Format ranked hits the way the configured mode presents them.
    pub fn render(&self, hits: &[QueryHit]) -> String {
        match self.mode {
            SearchMode::Plain => search::render_plain(hits),
            SearchMode::Chunked => search::render_chunked(hits),
        }
    }

    /// Collections in the store with their record counts.
    pub fn stats(&self) -> MemoryResult<Vec<CollectionInfo>> {
        self.open()?
            .list_collections()
            .map_err(MemoryError::StorageUnavailable)
    }
}
