//! Search modes and repository errors.

use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// How search results are shaped before they reach the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Personal facts: every hit, one per line, in rank order.
    #[default]
    Plain,
    /// Chunked reference articles: best chunk per source document under a header.
    Chunked,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Chunked => "chunked",
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plain" => Ok(Self::Plain),
            "chunked" => Ok(Self::Chunked),
            _ => Err(format!("unknown search mode: {s} (expected plain or chunked)")),
        }
    }
}

/// Failures surfaced to tool callers. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// The store or the collection could not be opened, or a query against it failed.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
    /// Embedding or writing a batch failed; the batch was not stored.
    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[source] StoreError),
    #[error("invalid document id {0:?}: must be non-empty and must not contain ':'")]
    InvalidDocumentId(String),
}
