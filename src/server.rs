//! MCP server startup over stdio or Streamable HTTP.
//!
//! Both entry points build the embedding provider once, make sure the
//! configured collection exists, and hand a [`HipaiTools`] to rmcp.

use crate::config::HipaiConfig;
use crate::embedding;
use crate::memory::MemoryRepository;
use crate::tools::HipaiTools;
use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

/// Repository over the configured store without touching the collection.
/// Read-only commands use this so inspecting a store never provisions it.
pub fn open_repository(config: &HipaiConfig) -> Result<MemoryRepository> {
    let provider = embedding::create_provider(&config.embedding)?;
    let embedder: Arc<dyn embedding::EmbeddingProvider> = Arc::from(provider);
    tracing::info!(provider = %config.embedding.provider, "embedding provider ready");
    Ok(MemoryRepository::from_config(config, embedder))
}

/// Build the repository the tools will share, creating the collection when
/// `storage.create_collection` is set.
pub fn build_repository(config: &HipaiConfig) -> Result<MemoryRepository> {
    let repository = open_repository(config)?;
    if config.storage.create_collection {
        repository
            .ensure_collection()
            .context("failed to prepare the memory collection")?;
    }
    tracing::info!(
        store = %config.resolved_store_path().display(),
        collection = %repository.collection(),
        mode = %repository.mode(),
        "memory repository ready"
    );
    Ok(repository)
}

/// Dispatch on `server.transport`.
pub async fn serve(config: HipaiConfig) -> Result<()> {
    match config.server.transport.as_str() {
        "stdio" => serve_stdio(config).await,
        "http" => serve_http(config).await,
        other => anyhow::bail!("unknown transport: {other}. Supported: stdio, http"),
    }
}

pub async fn serve_stdio(config: HipaiConfig) -> Result<()> {
    tracing::info!("starting HiPAI MCP server on stdio");

    let repository = build_repository(&config)?;
    let server = HipaiTools::new(repository)
        .serve(rmcp::transport::stdio())
        .await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");
    Ok(())
}

pub async fn serve_http(config: HipaiConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let repository = build_repository(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(HipaiTools::new(repository.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );
    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;
    Ok(())
}
