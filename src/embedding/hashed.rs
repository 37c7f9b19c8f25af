//! Deterministic token-hashing embeddings.
//!
//! Each lowercase alphanumeric token is hashed with FNV-1a into one bucket
//! with a sign bit, then the vector is L2-normalized. Texts sharing words land
//! close together. Useful offline and in tests; far weaker than a real model.

use anyhow::Result;

use super::{l2_normalize, EmbeddingProvider};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

pub struct HashedEmbeddingProvider {
    dimensions: usize,
}

impl HashedEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl EmbeddingProvider for HashedEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = fnv1a(token.to_lowercase().as_bytes());
            let bucket = (hash % self.dimensions as u64) as usize;
            v[bucket] += if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        }
        l2_normalize(&mut v);
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "fnv1a-token-hash"
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME)
    })
}
