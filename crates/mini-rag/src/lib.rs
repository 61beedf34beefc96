pub mod composer;
pub mod config;
pub mod corpus;
pub mod embeddings;
pub mod error;
pub mod interactive;
pub mod rag_engine;
pub mod retriever;
pub mod similarity;
pub mod types;

// Re-export primary types for convenience
pub use composer::{compose, format_ranked};
pub use config::{EmbeddingProvider, RagConfig};
pub use corpus::{default_documents, Corpus};
pub use embeddings::EmbeddingModel;
pub use error::{RagError, Result};
pub use rag_engine::{load_embeddings, Answer, RagEngine};
pub use retriever::retrieve_top_k;
pub use similarity::cosine_similarity;
pub use types::{Document, RankedResult, ScoredDocument, SourceDocument};
