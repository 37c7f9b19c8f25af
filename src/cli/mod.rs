pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use tokio::io::AsyncWriteExt;

use hipai::embedding::local::{model_paths, MODEL_FILE, TOKENIZER_FILE};

const MODEL_BASE_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Fetch the ONNX model and tokenizer into the configured cache dir.
/// Files already present are left alone.
pub async fn model_download(config: &hipai::config::EmbeddingConfig) -> Result<()> {
    let (model_path, tokenizer_path) = model_paths(config);
    for (remote, dest) in [
        (format!("{MODEL_BASE_URL}/onnx/{MODEL_FILE}"), model_path),
        (format!("{MODEL_BASE_URL}/{TOKENIZER_FILE}"), tokenizer_path),
    ] {
        if dest.exists() {
            println!("Already present: {}", dest.display());
            continue;
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        println!("Downloading {remote}");
        download_file(&remote, &dest).await?;
        println!("Saved {}", dest.display());
    }
    println!("Embedding model ready.");
    Ok(())
}

/// Stream `url` to `dest` through a `.part` file renamed on completion.
async fn download_file(url: &str, dest: &Path) -> Result<()> {
    let mut response = reqwest::get(url)
        .await
        .with_context(|| format!("HTTP request failed for {url}"))?;
    anyhow::ensure!(
        response.status().is_success(),
        "download of {url} failed with HTTP {}",
        response.status()
    );

    let pb = match response.content_length() {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("  {bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                    .context("invalid progress template")?
                    .progress_chars("##-"),
            );
            pb
        }
        None => ProgressBar::new_spinner(),
    };

    let part_path = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&part_path)
        .await
        .with_context(|| format!("failed to create {}", part_path.display()))?;
    while let Some(chunk) = response.chunk().await.context("error reading response body")? {
        file.write_all(&chunk).await.context("error writing download")?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&part_path, dest)
        .await
        .with_context(|| format!("failed to move download into {}", dest.display()))?;
    pb.finish_and_clear();
    Ok(())
}
