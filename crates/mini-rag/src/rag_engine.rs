use serde::Serialize;

use crate::composer::compose;
use crate::config::{EmbeddingProvider, RagConfig};
use crate::corpus::{default_documents, Corpus};
use crate::embeddings::{EmbeddingModel, HashingEmbeddings, MiniLmConfig, MiniLmEmbeddings};
use crate::error::{RagError, Result};
use crate::retriever::retrieve_top_k;
use crate::types::{RankedResult, SourceDocument};

/// Loaded embedder plus the embedded corpus. Built once, then read-only.
pub struct RagEngine {
    embeddings: Box<dyn EmbeddingModel>,
    corpus: Corpus,
    config: RagConfig,
}

/// Ranked documents and the composed answer for one query.
#[derive(Debug, Serialize)]
pub struct Answer<'a> {
    pub query: String,
    pub retrieved: RankedResult<'a>,
    pub text: String,
}

impl RagEngine {
    /// Load the configured embedder and embed the built-in corpus.
    pub fn new(config: RagConfig) -> Result<Self> {
        config.validate()?;
        let embeddings = load_embeddings(&config)?;
        Self::with_embeddings(config, embeddings, default_documents())
    }

    /// Build from an already-loaded embedder and a custom document set.
    pub fn with_embeddings(
        config: RagConfig,
        embeddings: Box<dyn EmbeddingModel>,
        documents: Vec<SourceDocument>,
    ) -> Result<Self> {
        tracing::info!(
            model = embeddings.name(),
            documents = documents.len(),
            "Creating document embeddings"
        );
        let corpus = Corpus::build(documents, embeddings.as_ref())?;

        Ok(Self {
            embeddings,
            corpus,
            config,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn default_k(&self) -> usize {
        self.config.search.default_k
    }

    pub fn retrieve_top_k(&self, query: &str, k: usize) -> Result<RankedResult<'_>> {
        retrieve_top_k(self.embeddings.as_ref(), &self.corpus, query, k)
    }

    /// Retrieve then compose.
    pub fn answer(&self, query: &str, k: usize) -> Result<Answer<'_>> {
        let retrieved = self.retrieve_top_k(query, k)?;
        let text = compose(query, &retrieved);
        Ok(Answer {
            query: query.to_string(),
            retrieved,
            text,
        })
    }
}

/// Instantiate the embedder selected by `config.embedding.provider`.
pub fn load_embeddings(config: &RagConfig) -> Result<Box<dyn EmbeddingModel>> {
    match config.embedding.provider {
        EmbeddingProvider::Hashing => {
            Ok(Box::new(HashingEmbeddings::new(config.embedding.dimension)))
        }
        EmbeddingProvider::MiniLm => {
            let model_dir = config.minilm_dir();
            let minilm = MiniLmConfig::from_dir(
                &model_dir,
                config.embedding.dimension,
                config.embedding.max_length,
            )
            .ok_or_else(|| {
                RagError::Config(format!(
                    "MiniLM model not found in {}",
                    model_dir.display()
                ))
            })?;
            Ok(Box::new(MiniLmEmbeddings::new(minilm)?))
        }
    }
}
