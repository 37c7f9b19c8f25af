mod cli;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hipai::{config, server};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hipai", version, about = "Personal-assistant memory MCP server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the MCP server (transport from config: stdio or http)
    Serve,
    /// Manage the embedding model
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Store one memory per argument
    Add {
        #[arg(required = true)]
        memories: Vec<String>,
    },
    /// Search memories the way the search_memories tool does
    Search {
        query: String,
        /// Number of nearest records to fetch
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Split a text file into chunks stored as <doc-id>:<index>
    Ingest {
        doc_id: String,
        file: PathBuf,
        /// Words per chunk (default: retrieval.chunk_words)
        #[arg(long)]
        chunk_words: Option<usize>,
    },
    /// List collections and record counts
    Stats,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the embedding model to ~/.hipai/models/
    Download,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::HipaiConfig::load()?;

    // stderr only: stdout carries MCP JSON-RPC on the stdio transport.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => server::serve(config).await?,
        Command::Model { action } => match action {
            ModelAction::Download => cli::model_download(&config.embedding).await?,
        },
        Command::Add { memories } => cli::search::add(&config, memories)?,
        Command::Search { query, k } => cli::search::search(&config, &query, k)?,
        Command::Ingest {
            doc_id,
            file,
            chunk_words,
        } => cli::search::ingest(&config, &doc_id, &file, chunk_words)?,
        Command::Stats => cli::stats::stats(&config)?,
    }

    Ok(())
}
