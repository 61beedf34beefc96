pub mod download;
pub mod hashing;
pub mod minilm;

use anyhow::Result;

pub use hashing::HashingEmbeddings;
pub use minilm::{MiniLmConfig, MiniLmEmbeddings};

/// Unified embedding model trait
pub trait EmbeddingModel: Send + Sync {
    /// Embed a search query
    fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a document
    fn embed_document(&self, text: &str) -> Result<Vec<f32>>;

    /// Batch embed documents, used once when the corpus is built
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed_document(t)).collect()
    }

    /// Embedding vector dimension
    fn dimension(&self) -> usize;

    fn name(&self) -> &str;
}
