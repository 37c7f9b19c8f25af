//! Configuration loading.
//!
//! Reads `~/.hipai/config.toml` when present, falls back to defaults for any
//! missing section or field, then applies `HIPAI_*` environment overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::memory::SearchMode;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct HipaiConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// `"stdio"` or `"http"`.
    pub transport: String,
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub store_path: String,
    pub collection: String,
    /// Create the collection on `serve` if it does not exist yet.
    pub create_collection: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// `"local"` (ONNX) or `"hashed"`.
    pub provider: String,
    pub model: String,
    pub cache_dir: String,
    pub intra_threads: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub mode: SearchMode,
    pub default_k: usize,
    pub chunk_words: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: "stdio".into(),
            host: "127.0.0.1".into(),
            port: 8765,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let store_path = default_hipai_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self {
            store_path,
            collection: "memories".into(),
            create_collection: true,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        let cache_dir = default_hipai_dir()
            .join("models")
            .to_string_lossy()
            .into_owned();
        Self {
            provider: "local".into(),
            model: "all-MiniLM-L6-v2".into(),
            cache_dir,
            intra_threads: 4,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::Plain,
            default_k: 10,
            chunk_words: 256,
        }
    }
}

/// Returns `~/.hipai/`, or `./.hipai/` when no home directory is known.
pub fn default_hipai_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hipai")
}

pub fn default_config_path() -> PathBuf {
    default_hipai_dir().join("config.toml")
}

impl HipaiConfig {
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            HipaiConfig::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    /// HIPAI_STORE, HIPAI_COLLECTION, HIPAI_MODE, HIPAI_LOG_LEVEL.
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(val) = std::env::var("HIPAI_STORE") {
            self.storage.store_path = val;
        }
        if let Ok(val) = std::env::var("HIPAI_COLLECTION") {
            self.storage.collection = val;
        }
        if let Ok(val) = std::env::var("HIPAI_MODE") {
            self.retrieval.mode = val
                .parse()
                .map_err(|e: String| anyhow::anyhow!(e))
                .context("invalid HIPAI_MODE")?;
        }
        if let Ok(val) = std::env::var("HIPAI_LOG_LEVEL") {
            self.server.log_level = val;
        }
        Ok(())
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        expand_tilde(&self.storage.store_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
