//! Text-to-vector embedding.
//!
//! The vector store embeds every document at upsert time and every query
//! text at query time through an [`EmbeddingProvider`]. Two providers exist:
//! [`local::LocalEmbeddingProvider`] (ONNX all-MiniLM-L6-v2) and
//! [`hashed::HashedEmbeddingProvider`] (token hashing, no model files).

pub mod hashed;
pub mod local;

use anyhow::Result;

/// Number of dimensions in the embedding vectors (all-MiniLM-L6-v2).
pub const EMBEDDING_DIM: usize = 384;

/// Turns text into L2-normalized vectors of [`EmbeddingProvider::dimensions`] length.
///
/// Methods are synchronous; async callers go through `spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, in input order.
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIM
    }

    /// Identifier recorded in the store so a model switch can be detected.
    fn model_id(&self) -> &str;
}

/// Build the provider named by `config.provider`.
pub fn create_provider(
    config: &crate::config::EmbeddingConfig,
) -> Result<Box<dyn EmbeddingProvider>> {
    match config.provider.as_str() {
        "local" => Ok(Box::new(local::LocalEmbeddingProvider::new(config)?)),
        "hashed" => Ok(Box::new(hashed::HashedEmbeddingProvider::new(EMBEDDING_DIM))),
        other => anyhow::bail!("unknown embedding provider: {other}. Supported: local, hashed"),
    }
}

/// L2-normalize in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}
