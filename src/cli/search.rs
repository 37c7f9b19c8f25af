use anyhow::{Context, Result};

use hipai::config::HipaiConfig;

/// Store facts from the command line.
pub fn add(config: &HipaiConfig, texts: Vec<String>) -> Result<()> {
    let repository = hipai::server::build_repository(config)?;
    let stored = repository.add_memories(&texts)?;
    println!(
        "Stored {stored} memor{} in '{}'",
        if stored == 1 { "y" } else { "ies" },
        repository.collection()
    );
    Ok(())
}

/// Chunk a text file into the collection under `doc_id`.
pub fn ingest(
    config: &HipaiConfig,
    doc_id: &str,
    path: &std::path::Path,
    chunk_words: Option<usize>,
) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let repository = hipai::server::build_repository(config)?;
    let chunks = repository.add_document(
        doc_id,
        &text,
        chunk_words.unwrap_or(config.retrieval.chunk_words),
    )?;
    println!("Stored {chunks} chunk(s) of {} as '{doc_id}'", path.display());
    Ok(())
}

/// Run a search and show both the ranked hits and what the model would see.
pub fn search(config: &HipaiConfig, query: &str, k: Option<usize>) -> Result<()> {
    let repository = hipai::server::open_repository(config)?;

    let hits = repository.search_hits(query, k)?;
    if hits.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} hit(s):\n", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.document.chars().take(120).collect();
        let ellipsis = if hit.document.chars().count() > 120 { "..." } else { "" };
        println!("  {}. {} (distance: {:.4})", i + 1, hit.id, hit.distance);
        println!("     {preview}{ellipsis}");
    }

    println!("\n--- tool output ({} mode) ---", repository.mode());
    print!("{}", repository.render(&hits));
    Ok(())
}
