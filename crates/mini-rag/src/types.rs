use serde::{Deserialize, Serialize};

/// Un-embedded input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Document with its embedding, fixed once the corpus is built.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A document paired with its similarity to one query.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredDocument<'a> {
    #[serde(flatten)]
    pub document: &'a Document,
    pub score: f32,
}

impl ScoredDocument<'_> {
    pub fn id(&self) -> &str {
        &self.document.id
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }
}

/// Top-k documents, descending score, ties in corpus order.
pub type RankedResult<'a> = Vec<ScoredDocument<'a>>;
