//! ONNX Runtime embeddings with all-MiniLM-L6-v2.
//!
//! Pipeline: tokenize (truncate, pad to batch longest) → run the model →
//! attention-masked mean pooling over token embeddings → L2 normalize.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

use super::{l2_normalize, EmbeddingProvider, EMBEDDING_DIM};
use crate::config::EmbeddingConfig;

/// all-MiniLM-L6-v2 was trained with 256-token sequences.
const MAX_SEQ_LEN: usize = 256;

pub const MODEL_FILE: &str = "model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub struct LocalEmbeddingProvider {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model: String,
}

// Safety: the session is only touched through the Mutex; Tokenizer is Send + Sync.
unsafe impl Send for LocalEmbeddingProvider {}
unsafe impl Sync for LocalEmbeddingProvider {}

/// Flattened `[batch, seq]` model inputs.
struct Batch {
    batch_size: usize,
    seq_len: usize,
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
}

impl LocalEmbeddingProvider {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_path, tokenizer_path) = model_paths(config);

        anyhow::ensure!(
            model_path.exists(),
            "ONNX model not found at {}. Run `hipai model download` first.",
            model_path.display()
        );
        anyhow::ensure!(
            tokenizer_path.exists(),
            "Tokenizer not found at {}. Run `hipai model download` first.",
            tokenizer_path.display()
        );

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads.max(1))?
            .commit_from_file(&model_path)
            .with_context(|| format!("failed to load ONNX model {}", model_path.display()))?;

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer: {e}"))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: MAX_SEQ_LEN,
                ..Default::default()
            }))
            .map_err(|e| anyhow::anyhow!("failed to set truncation: {e}"))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));

        tracing::info!(model = %model_path.display(), "local embedding model loaded");

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model: config.model.clone(),
        })
    }

    fn tokenize(&self, texts: &[&str]) -> Result<Batch> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {e}"))?;

        let seq_len = encodings.first().map_or(0, |e| e.get_ids().len());
        let mut batch = Batch {
            batch_size: encodings.len(),
            seq_len,
            input_ids: Vec::with_capacity(encodings.len() * seq_len),
            attention_mask: Vec::with_capacity(encodings.len() * seq_len),
        };
        for encoding in &encodings {
            batch
                .input_ids
                .extend(encoding.get_ids().iter().map(|&id| i64::from(id)));
            batch
                .attention_mask
                .extend(encoding.get_attention_mask().iter().map(|&m| i64::from(m)));
        }
        Ok(batch)
    }
}

/// Paths of the model and tokenizer inside the configured cache dir.
pub fn model_paths(config: &EmbeddingConfig) -> (PathBuf, PathBuf) {
    let cache_dir = crate::config::expand_tilde(&config.cache_dir);
    (cache_dir.join(MODEL_FILE), cache_dir.join(TOKENIZER_FILE))
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text])?
            .pop()
            .context("embedding batch returned no vectors")
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let batch = self.tokenize(texts)?;
        let shape = vec![batch.batch_size as i64, batch.seq_len as i64];
        let input_ids = Tensor::from_array((shape.clone(), batch.input_ids.into_boxed_slice()))?;
        let attention_mask =
            Tensor::from_array((shape.clone(), batch.attention_mask.clone().into_boxed_slice()))?;
        // single segment: token types are all zero
        let token_type_ids = Tensor::from_array((
            shape,
            vec![0i64; batch.batch_size * batch.seq_len].into_boxed_slice(),
        ))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| anyhow::anyhow!("onnx session lock poisoned: {e}"))?;
        let outputs = session.run(ort::inputs! {
            "input_ids" => input_ids,
            "attention_mask" => attention_mask,
            "token_type_ids" => token_type_ids,
        })?;

        // Output naming differs between exports.
        let hidden = outputs
            .get("last_hidden_state")
            .or_else(|| outputs.get("token_embeddings"))
            .unwrap_or_else(|| &outputs[0]);
        let (dims, data) = hidden
            .try_extract_tensor::<f32>()
            .context("failed to extract token embeddings")?;

        let dims: &[i64] = &dims;
        anyhow::ensure!(
            dims.len() == 3 && dims[2] == EMBEDDING_DIM as i64,
            "unexpected token embeddings shape {dims:?}, expected [batch, seq, {EMBEDDING_DIM}]"
        );

        Ok(mean_pool(
            data,
            &batch.attention_mask,
            batch.batch_size,
            dims[1] as usize,
            dims[2] as usize,
        ))
    }

    fn model_id(&self) -> &str {
        &self.model
    }
}

/// Average token vectors where the mask is set, then normalize each row.
///
/// `data` is `[batch, seq, hidden]` row-major; `mask` is `[batch, seq]`.
fn mean_pool(data: &[f32], mask: &[i64], batch: usize, seq: usize, hidden: usize) -> Vec<Vec<f32>> {
    (0..batch)
        .map(|b| {
            let mut pooled = vec![0.0f32; hidden];
            let mut tokens = 0usize;
            for s in 0..seq {
                if mask[b * seq + s] == 0 {
                    continue;
                }
                let row = &data[(b * seq + s) * hidden..][..hidden];
                pooled.iter_mut().zip(row).for_each(|(acc, x)| *acc += x);
                tokens += 1;
            }
            if tokens > 0 {
                pooled.iter_mut().for_each(|x| *x /= tokens as f32);
            }
            l2_normalize(&mut pooled);
            pooled
        })
        .collect()
}
