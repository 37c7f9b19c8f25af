//! Vector collection store over SQLite + sqlite-vec.
//!
//! A [`VectorStore`] is one SQLite file holding any number of named
//! collections. Each [`Collection`] keeps `(id, document)` records and one
//! embedding per record, produced by the store's [`EmbeddingProvider`] at
//! upsert time. Queries are text in, ranked `(id, document, distance)` out.

mod collection;
pub mod schema;

pub use collection::{Collection, QueryHit, QueryResult, MAX_N_RESULTS};

use rusqlite::{params, Connection, OptionalExtension};
use sqlite_vec::sqlite3_vec_init;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Once};

use crate::embedding::EmbeddingProvider;

static SQLITE_VEC_INIT: Once = Once::new();

/// Milliseconds a writer waits on a locked database before failing.
const BUSY_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open vector store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("collection not found: {0}")]
    CollectionNotFound(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("got {ids} ids but {documents} documents")]
    LengthMismatch { ids: usize, documents: usize },
    #[error("collection {collection} stores {expected}-dim vectors, embedder produces {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Register sqlite-vec for every connection opened afterwards. Safe to call repeatedly.
pub fn load_sqlite_vec() {
    SQLITE_VEC_INIT.call_once(|| unsafe {
        rusqlite::ffi::sqlite3_auto_extension(Some(std::mem::transmute(
            sqlite3_vec_init as *const (),
        )));
    });
}

/// An open handle on the store file.
pub struct VectorStore {
    conn: Connection,
    embedder: Arc<dyn EmbeddingProvider>,
}

/// Name and size of a collection, for listings.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CollectionInfo {
    pub name: String,
    pub dimensions: usize,
    pub count: usize,
    pub created_at: String,
}

impl VectorStore {
    /// Open (or create) the store file at `path` and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>, embedder: Arc<dyn EmbeddingProvider>) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        load_sqlite_vec();
        let open_err = |source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        };
        let conn = Connection::open(path).map_err(open_err)?;
        conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(open_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(open_err)?;
        schema::init_schema(&conn).map_err(open_err)?;

        tracing::debug!(path = %path.display(), "vector store opened");
        Ok(Self { conn, embedder })
    }

    /// Store backed by an in-memory database.
    pub fn open_in_memory(embedder: Arc<dyn EmbeddingProvider>) -> StoreResult<Self> {
        load_sqlite_vec();
        let conn = Connection::open_in_memory()?;
        schema::init_schema(&conn)?;
        Ok(Self { conn, embedder })
    }

    /// Look up an existing collection.
    pub fn get_collection(&self, name: &str) -> StoreResult<Collection<'_>> {
        let row: Option<(i64, i64)> = self
            .conn
            .query_row(
                "SELECT id, dimensions FROM collections WHERE name = ?1",
                params![name],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let (id, dimensions) = row.ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))?;
        let dimensions = dimensions as usize;
        if dimensions != self.embedder.dimensions() {
            return Err(StoreError::DimensionMismatch {
                collection: name.to_string(),
                expected: dimensions,
                actual: self.embedder.dimensions(),
            });
        }
        Ok(Collection::new(&self.conn, self.embedder.as_ref(), id, name))
    }

    /// Get the collection, creating it with the embedder's width if it is missing.
    pub fn create_collection(&self, name: &str) -> StoreResult<Collection<'_>> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO collections (name, dimensions, created_at) VALUES (?1, ?2, ?3)",
            params![
                name,
                self.embedder.dimensions() as i64,
                chrono::Utc::now().to_rfc3339()
            ],
        )?;
        let id: i64 = self.conn.query_row(
            "SELECT id FROM collections WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        schema::create_vec_table(&self.conn, id, self.embedder.dimensions())?;

        if created > 0 {
            tracing::info!(collection = name, dimensions = self.embedder.dimensions(), "collection created");
        }
        self.get_collection(name)
    }

    /// All collections with their record counts, by name.
    pub fn list_collections(&self) -> StoreResult<Vec<CollectionInfo>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.name, c.dimensions, c.created_at, \
             (SELECT COUNT(*) FROM records r WHERE r.collection_id = c.id) \
             FROM collections c ORDER BY c.name",
        )?;
        let infos = stmt
            .query_map([], |row| {
                Ok(CollectionInfo {
                    name: row.get(0)?,
                    dimensions: row.get::<_, i64>(1)? as usize,
                    created_at: row.get(2)?,
                    count: row.get::<_, i64>(3)? as usize,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(infos)
    }

    /// Record the embedding model in use, returning the previously stored one if it differs.
    pub fn check_embedding_model(&self) -> StoreResult<Option<String>> {
        let current = self.embedder.model_id();
        match schema::get_meta(&self.conn, schema::EMBEDDING_MODEL_KEY)? {
            Some(stored) if stored != current => Ok(Some(stored)),
            Some(_) => Ok(None),
            None => {
                schema::set_meta(&self.conn, schema::EMBEDDING_MODEL_KEY, current)?;
                Ok(None)
            }
        }
    }
}

/// Encode a vector as the little-endian f32 blob sqlite-vec expects.
pub(crate) fn embedding_to_blob(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|x| x.to_le_bytes()).collect()
}
