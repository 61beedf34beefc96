use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::path::PathBuf;

use mini_rag::embeddings::download::ensure_minilm_model;
use mini_rag::interactive::{answer_query, run_session, SessionOptions};
use mini_rag::{default_documents, load_embeddings, EmbeddingProvider, RagConfig, RagEngine};

/// Ask questions against a small company-policy knowledge base.
#[derive(Parser, Debug)]
#[command(name = "mini-rag", version, about = "Minimal retrieval-augmented answering")]
struct Cli {
    /// Number of documents to retrieve per question.
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// JSON config file.
    #[arg(short, long, env = "MINI_RAG_CONFIG")]
    config: Option<PathBuf>,

    /// Use the hashing embedder; no model files or network needed.
    #[arg(long)]
    offline: bool,

    /// Print each answer as JSON as well.
    #[arg(long)]
    json: bool,

    /// Answer a single question and exit.
    #[arg(short, long)]
    query: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the conversation; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RagConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RagConfig::default(),
    };
    if cli.offline {
        config = config.offline();
    }

    let options = SessionOptions {
        k: cli.top_k.unwrap_or(config.search.default_k),
        json: cli.json,
    };

    println!("Loading embedding model...");
    if config.embedding.provider == EmbeddingProvider::MiniLm && config.embedding.auto_download {
        ensure_minilm_model(&config.embedding.model_dir)
            .await
            .context("Failed to fetch embedding model")?;
    }
    let embeddings = load_embeddings(&config).context("Failed to load embedding model")?;

    println!("Creating document embeddings...");
    let engine = RagEngine::with_embeddings(config, embeddings, default_documents())
        .context("Failed to embed documents")?;

    if let Some(query) = cli.query.as_deref() {
        answer_query(&engine, options, query, &mut io::stdout().lock())?;
        return Ok(());
    }

    println!("Mini RAG system ready!");
    let mut out = io::stdout().lock();
    let answered = run_session(&engine, options, io::stdin().lock(), &mut out)?;
    tracing::info!(answered, "Session ended");

    Ok(())
}
