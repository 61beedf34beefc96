//! Fetch the all-MiniLM-L6-v2 ONNX export from Hugging Face on first run.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::MINILM_DIR;

const HF_BASE: &str = "https://huggingface.co";
const MINILM_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
const MAX_RETRIES: u32 = 3;

/// (path in the repo, local file name, smallest size accepted as complete)
struct ModelFile {
    url_path: &'static str,
    local_name: &'static str,
    min_bytes: u64,
}

const MINILM_FILES: &[ModelFile] = &[
    ModelFile {
        url_path: "onnx/model.onnx",
        local_name: "model.onnx",
        min_bytes: 50_000_000, // ~90 MB
    },
    ModelFile {
        url_path: "tokenizer.json",
        local_name: "tokenizer.json",
        min_bytes: 100_000, // ~460 KB
    },
];

/// Ensure the MiniLM model is present under `model_dir`, downloading missing
/// or truncated files. Returns the model directory.
pub async fn ensure_minilm_model(model_dir: &Path) -> Result<PathBuf> {
    let target_dir = model_dir.join(MINILM_DIR);

    let missing = missing_files(&target_dir);
    if missing.is_empty() {
        return Ok(target_dir);
    }

    tracing::info!(
        missing_files = missing.len(),
        dir = %target_dir.display(),
        "Downloading embedding model from Hugging Face"
    );

    tokio::fs::create_dir_all(&target_dir).await.map_err(|e| {
        anyhow!(
            "Failed to create model directory {}: {}",
            target_dir.display(),
            e
        )
    })?;

    let client = reqwest::Client::builder()
        .user_agent("mini-rag/0.1")
        .timeout(Duration::from_secs(600))
        .connect_timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

    for file in missing {
        let url = format!("{}/{}/resolve/main/{}", HF_BASE, MINILM_REPO, file.url_path);
        let dest = target_dir.join(file.local_name);
        download_with_retry(&client, &url, &dest, file.local_name).await?;
    }

    tracing::info!("Embedding model ready");
    Ok(target_dir)
}

fn missing_files(target_dir: &Path) -> Vec<&'static ModelFile> {
    MINILM_FILES
        .iter()
        .filter(|f| match target_dir.join(f.local_name).metadata() {
            Ok(meta) => meta.len() < f.min_bytes,
            Err(_) => true,
        })
        .collect()
}

async fn download_with_retry(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    filename: &str,
) -> Result<()> {
    let mut last_error = None;

    for attempt in 1..=MAX_RETRIES {
        match download_streaming(client, url, dest, filename).await {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_error = Some(e);
                if attempt < MAX_RETRIES {
                    let backoff = Duration::from_secs(2u64.pow(attempt));
                    tracing::warn!(
                        file = filename,
                        attempt,
                        "Download failed, retrying in {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| anyhow!("Download failed after {} retries", MAX_RETRIES)))
}

/// Stream to `<dest>.downloading`, then rename into place. A failed attempt
/// removes the partial file.
async fn download_streaming(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    filename: &str,
) -> Result<()> {
    let tmp_dest = dest.with_extension("downloading");

    let result = match stream_to_file(client, url, &tmp_dest, filename).await {
        Ok(()) => tokio::fs::rename(&tmp_dest, dest)
            .await
            .map_err(|e| anyhow!("Failed to finalize {}: {}", filename, e)),
        Err(e) => Err(e),
    };

    if result.is_err() && tokio::fs::remove_file(&tmp_dest).await.is_ok() {
        tracing::debug!(file = %tmp_dest.display(), "Removed partial download");
    }
    result
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    tmp_dest: &Path,
    filename: &str,
) -> Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| anyhow!("HTTP request failed for {}: {}", filename, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(anyhow!("HTTP {} downloading {} from {}", status, filename, url));
    }

    let total_size = response.content_length().unwrap_or(0);
    tracing::info!(
        file = filename,
        size_mb = format!("{:.1}", total_size as f64 / 1_048_576.0),
        "Downloading"
    );

    let mut file = tokio::fs::File::create(tmp_dest)
        .await
        .map_err(|e| anyhow!("Failed to create {}: {}", tmp_dest.display(), e))?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let mut last_log_pct: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| anyhow!("Stream error downloading {}: {}", filename, e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| anyhow!("Write error for {}: {}", filename, e))?;
        downloaded += chunk.len() as u64;

        if total_size > 0 {
            let pct = (downloaded * 100) / total_size;
            if pct >= last_log_pct + 25 {
                last_log_pct = pct - (pct % 25);
                tracing::info!(
                    file = filename,
                    progress = format!("{}%", last_log_pct),
                    "Download progress"
                );
            }
        }
    }

    file.flush().await?;
    Ok(())
}
