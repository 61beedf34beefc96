use thiserror::Error;

/// Errors surfaced by corpus construction, scoring and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// The embedding model failed; not retried.
    #[error("embedding failed: {0}")]
    Embedding(anyhow::Error),

    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("duplicate document id '{0}'")]
    DuplicateDocumentId(String),

    #[error("embedder returned {actual} vectors for {expected} documents")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        Self::Embedding(err)
    }
}

pub type Result<T> = std::result::Result<T, RagError>;
