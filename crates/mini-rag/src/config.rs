use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RagError, Result};

/// Model directory name used under `model_dir`.
pub const MINILM_DIR: &str = "all-MiniLM-L6-v2";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    pub embedding: EmbeddingConfig,
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// all-MiniLM-L6-v2 through ONNX Runtime
    MiniLm,
    /// Offline hashed bag-of-words vectors
    Hashing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model_dir: PathBuf,
    pub dimension: usize,
    /// Token cap per text for the ONNX provider.
    pub max_length: usize,
    /// Fetch missing model files from Hugging Face at startup.
    pub auto_download: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub default_k: usize,
}

impl RagConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        if self.embedding.dimension == 0 {
            return Err(RagError::Config("embedding.dimension must be > 0".into()));
        }
        if self.embedding.max_length == 0 {
            return Err(RagError::Config("embedding.max_length must be > 0".into()));
        }
        if self.search.default_k == 0 {
            return Err(RagError::Config("search.default_k must be > 0".into()));
        }
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| RagError::Config(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Same config with the offline hashing provider swapped in.
    pub fn offline(mut self) -> Self {
        self.embedding.provider = EmbeddingProvider::Hashing;
        self.embedding.auto_download = false;
        self
    }

    pub fn minilm_dir(&self) -> PathBuf {
        self.embedding.model_dir.join(MINILM_DIR)
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        let model_dir = if Path::new("models").exists() {
            PathBuf::from("models")
        } else if let Ok(env_path) = std::env::var("MODEL_PATH") {
            PathBuf::from(env_path)
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("mini-rag")
                .join("models")
        };

        Self {
            embedding: EmbeddingConfig {
                provider: EmbeddingProvider::MiniLm,
                model_dir,
                dimension: 384,
                max_length: 256,
                auto_download: true,
            },
            search: SearchConfig { default_k: 2 },
        }
    }
}
