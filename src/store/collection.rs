use rusqlite::{params, Connection, Transaction, TransactionBehavior};

use super::schema::vec_table_name;
use super::{embedding_to_blob, StoreError, StoreResult};
use crate::embedding::EmbeddingProvider;

/// Largest `k` a sqlite-vec KNN query accepts.
pub const MAX_N_RESULTS: usize = 4096;

/// A named collection inside an open [`super::VectorStore`].
pub struct Collection<'a> {
    conn: &'a Connection,
    embedder: &'a dyn EmbeddingProvider,
    id: i64,
    name: String,
}

/// Ranked hits per query text. The outer index follows the input texts;
/// inner vectors are ordered by ascending distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    pub ids: Vec<Vec<String>>,
    pub documents: Vec<Vec<String>>,
    pub distances: Vec<Vec<f64>>,
}

/// One ranked hit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub distance: f64,
}

impl QueryResult {
    /// Hits for the `index`-th query text, in rank order.
    pub fn hits(&self, index: usize) -> Vec<QueryHit> {
        let (Some(ids), Some(documents), Some(distances)) = (
            self.ids.get(index),
            self.documents.get(index),
            self.distances.get(index),
        ) else {
            return Vec::new();
        };
        ids.iter()
            .zip(documents)
            .zip(distances)
            .map(|((id, document), distance)| QueryHit {
                id: id.clone(),
                document: document.clone(),
                distance: *distance,
            })
            .collect()
    }
}

impl<'a> Collection<'a> {
    pub(super) fn new(
        conn: &'a Connection,
        embedder: &'a dyn EmbeddingProvider,
        id: i64,
        name: &str,
    ) -> Self {
        Self {
            conn,
            embedder,
            id,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or overwrite records by id.
    ///
    /// Every document is embedded before anything is written, and all rows go
    /// in one transaction: the call either stores the whole batch or nothing.
    pub fn upsert(&self, ids: &[String], documents: &[String]) -> StoreResult<()> {
        if ids.len() != documents.len() {
            return Err(StoreError::LengthMismatch {
                ids: ids.len(),
                documents: documents.len(),
            });
        }
        if ids.is_empty() {
            return Ok(());
        }

        let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .map_err(|e| StoreError::Embedding(format!("{e:#}")))?;
        if embeddings.len() != ids.len() {
            return Err(StoreError::Embedding(format!(
                "expected {} vectors, got {}",
                ids.len(),
                embeddings.len()
            )));
        }

        let vec_table = vec_table_name(self.id);
        let now = chrono::Utc::now().to_rfc3339();
        // IMMEDIATE takes the write lock up front so concurrent writers wait on busy_timeout.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        {
            let mut upsert_record = tx.prepare(
                "INSERT INTO records (collection_id, record_id, document, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4) \
                 ON CONFLICT(collection_id, record_id) \
                 DO UPDATE SET document = excluded.document, updated_at = excluded.updated_at",
            )?;
            let mut record_rowid =
                tx.prepare("SELECT id FROM records WHERE collection_id = ?1 AND record_id = ?2")?;
            let mut delete_vec = tx.prepare(&format!("DELETE FROM {vec_table} WHERE rowid = ?1"))?;
            let mut insert_vec =
                tx.prepare(&format!("INSERT INTO {vec_table} (rowid, embedding) VALUES (?1, ?2)"))?;

            for ((id, document), embedding) in ids.iter().zip(documents).zip(&embeddings) {
                upsert_record.execute(params![self.id, id, document, now])?;
                let rowid: i64 = record_rowid.query_row(params![self.id, id], |row| row.get(0))?;
                delete_vec.execute(params![rowid])?;
                insert_vec.execute(params![rowid, embedding_to_blob(embedding)])?;
            }
        }
        tx.commit()?;

        tracing::debug!(collection = %self.name, count = ids.len(), "records upserted");
        Ok(())
    }

    /// Nearest records for each query text, at most `n_results` per text.
    ///
    /// `n_results` above [`MAX_N_RESULTS`] is clamped.
    pub fn query(&self, texts: &[String], n_results: usize) -> StoreResult<QueryResult> {
        if n_results > MAX_N_RESULTS {
            tracing::debug!(requested = n_results, max = MAX_N_RESULTS, "n_results clamped");
        }
        let n_results = n_results.min(MAX_N_RESULTS);
        let mut result = QueryResult::default();
        for text in texts {
            let hits = if n_results == 0 {
                Vec::new()
            } else {
                let embedding = self
                    .embedder
                    .embed(text)
                    .map_err(|e| StoreError::Embedding(format!("{e:#}")))?;
                self.nearest(&embedding, n_results)?
            };
            result.ids.push(hits.iter().map(|h| h.id.clone()).collect());
            result.distances.push(hits.iter().map(|h| h.distance).collect());
            result
                .documents
                .push(hits.into_iter().map(|h| h.document).collect());
        }
        Ok(result)
    }

    /// Number of records in the collection.
    pub fn count(&self) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records WHERE collection_id = ?1",
            params![self.id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn nearest(&self, embedding: &[f32], limit: usize) -> StoreResult<Vec<QueryHit>> {
        let mut knn = self.conn.prepare(&format!(
            "SELECT rowid, distance FROM {} WHERE embedding MATCH ?1 ORDER BY distance LIMIT ?2",
            vec_table_name(self.id)
        ))?;
        let ranked: Vec<(i64, f64)> = knn
            .query_map(params![embedding_to_blob(embedding), limit as i64], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut record = self
            .conn
            .prepare("SELECT record_id, document FROM records WHERE id = ?1")?;
        ranked
            .into_iter()
            .map(|(rowid, distance)| -> StoreResult<QueryHit> {
                let (id, document) =
                    record.query_row(params![rowid], |row| Ok((row.get(0)?, row.get(1)?)))?;
                Ok(QueryHit {
                    id,
                    document,
                    distance,
                })
            })
            .collect()
    }
}
