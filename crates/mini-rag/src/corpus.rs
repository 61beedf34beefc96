use std::collections::HashSet;

use crate::embeddings::EmbeddingModel;
use crate::error::{RagError, Result};
use crate::types::{Document, SourceDocument};

const DEFAULT_TEXTS: [&str; 4] = [
    "Employees get 12 paid leave days per year.",
    "The office is open from Monday to Friday, 9 AM to 6 PM.",
    "You can work from home up to 2 days per week with manager approval.",
    "Health insurance is provided after 3 months of joining the company.",
];

/// Built-in knowledge base, ids `doc_0`..`doc_3`.
pub fn default_documents() -> Vec<SourceDocument> {
    DEFAULT_TEXTS
        .iter()
        .enumerate()
        .map(|(i, text)| SourceDocument::new(format!("doc_{}", i), *text))
        .collect()
}

/// Ordered, embedded, read-only document set.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    dimension: usize,
}

impl Corpus {
    /// Embed every document in one batch call. Ids must be unique and all
    /// vectors must share one length.
    pub fn build(sources: Vec<SourceDocument>, embedder: &dyn EmbeddingModel) -> Result<Self> {
        let mut seen = HashSet::with_capacity(sources.len());
        for doc in &sources {
            if !seen.insert(doc.id.as_str()) {
                return Err(RagError::DuplicateDocumentId(doc.id.clone()));
            }
        }

        if sources.is_empty() {
            return Ok(Self {
                documents: Vec::new(),
                dimension: embedder.dimension(),
            });
        }

        let texts: Vec<&str> = sources.iter().map(|d| d.text.as_str()).collect();
        let embeddings = embedder.embed_documents(&texts)?;

        if embeddings.len() != sources.len() {
            return Err(RagError::EmbeddingCount {
                expected: sources.len(),
                actual: embeddings.len(),
            });
        }

        let dimension = embeddings[0].len();
        if let Some(bad) = embeddings.iter().find(|e| e.len() != dimension) {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: bad.len(),
            });
        }

        let documents = sources
            .into_iter()
            .zip(embeddings)
            .map(|(source, embedding)| Document {
                id: source.id,
                text: source.text,
                embedding,
            })
            .collect();

        Ok(Self {
            documents,
            dimension,
        })
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Length every query vector must match.
    pub fn dimension(&self) -> usize {
        self.dimension
    }
}
