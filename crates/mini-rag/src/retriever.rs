use crate::corpus::Corpus;
use crate::embeddings::EmbeddingModel;
use crate::error::{RagError, Result};
use crate::similarity::cosine_similarity;
use crate::types::{RankedResult, ScoredDocument};

/// Embed `query` once, score it against every document, and return the `k`
/// best in descending score order. Equal scores keep corpus order.
///
/// `k == 0` and an empty corpus both yield an empty result; `k` larger than
/// the corpus yields the whole corpus.
pub fn retrieve_top_k<'c>(
    embedder: &dyn EmbeddingModel,
    corpus: &'c Corpus,
    query: &str,
    k: usize,
) -> Result<RankedResult<'c>> {
    if k == 0 || corpus.is_empty() {
        return Ok(Vec::new());
    }

    let query_embedding = embedder.embed_query(query)?;
    if query_embedding.len() != corpus.dimension() {
        return Err(RagError::DimensionMismatch {
            expected: corpus.dimension(),
            actual: query_embedding.len(),
        });
    }

    let mut ranked = corpus
        .documents()
        .iter()
        .map(|document| {
            cosine_similarity(&query_embedding, &document.embedding)
                .map(|score| ScoredDocument { document, score })
        })
        .collect::<Result<Vec<_>>>()?;

    rank(&mut ranked, k);

    tracing::debug!(
        query = query,
        k = k,
        returned = ranked.len(),
        top_score = ranked.first().map(|r| r.score).unwrap_or(0.0),
        "Retrieved documents"
    );

    Ok(ranked)
}

/// Stable descending sort by score, then truncate to `k`. NaN scores rank
/// last.
pub fn rank(scored: &mut Vec<ScoredDocument<'_>>, k: usize) {
    // sort_by is stable, so ties stay in corpus order
    scored.sort_by(|a, b| sort_key(b.score).total_cmp(&sort_key(a.score)));
    scored.truncate(k);
}

/// Total order key: NaN below every real score, -0.0 equal to 0.0.
fn sort_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score + 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::default_documents;
    use crate::embeddings::HashingEmbeddings;
    use crate::types::{Document, SourceDocument};
    use proptest::prelude::*;

    /// Looks up fixed vectors by text; the query is keyed the same way.
    struct TableEmbedder {
        table: Vec<(&'static str, Vec<f32>)>,
    }

    impl TableEmbedder {
        fn lookup(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.table
                .iter()
                .find(|(t, _)| *t == text)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| anyhow::anyhow!("no vector for '{}'", text))
        }
    }

    impl EmbeddingModel for TableEmbedder {
        fn embed_query(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.lookup(text)
        }

        fn embed_document(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            self.lookup(text)
        }

        fn dimension(&self) -> usize {
            2
        }

        fn name(&self) -> &str {
            "table"
        }
    }

    fn table_corpus() -> (TableEmbedder, Corpus) {
        let embedder = TableEmbedder {
            table: vec![
                ("north", vec![0.0, 1.0]),
                ("east", vec![1.0, 0.0]),
                ("northeast", vec![1.0, 1.0]),
                ("also east", vec![2.0, 0.0]),
                ("query east", vec![1.0, 0.0]),
            ],
        };
        let docs = vec![
            SourceDocument::new("n", "north"),
            SourceDocument::new("e1", "east"),
            SourceDocument::new("ne", "northeast"),
            SourceDocument::new("e2", "also east"),
        ];
        let corpus = Corpus::build(docs, &embedder).unwrap();
        (embedder, corpus)
    }

    fn ids<'a>(ranked: &'a RankedResult<'_>) -> Vec<&'a str> {
        ranked.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_ranks_by_score_with_stable_ties() {
        let (embedder, corpus) = table_corpus();
        let ranked = retrieve_top_k(&embedder, &corpus, "query east", 4).unwrap();
        // e1 and e2 both score 1.0; e1 comes first in the corpus
        assert_eq!(ids(&ranked), vec!["e1", "e2", "ne", "n"]);
        assert!((ranked[0].score - 1.0).abs() < 1e-6);
        assert!((ranked[2].score - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
        assert!(ranked[3].score.abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_k() {
        let (embedder, corpus) = table_corpus();
        let ranked = retrieve_top_k(&embedder, &corpus, "query east", 2).unwrap();
        assert_eq!(ids(&ranked), vec!["e1", "e2"]);
    }

    #[test]
    fn test_k_zero_is_empty() {
        let (embedder, corpus) = table_corpus();
        assert!(retrieve_top_k(&embedder, &corpus, "query east", 0)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_empty_corpus_is_empty() {
        let embedder = HashingEmbeddings::new(16);
        let corpus = Corpus::build(Vec::new(), &embedder).unwrap();
        assert!(retrieve_top_k(&embedder, &corpus, "anything", 3)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_embedder_failure_propagates() {
        let (embedder, corpus) = table_corpus();
        let err = retrieve_top_k(&embedder, &corpus, "unknown query", 2).unwrap_err();
        assert!(matches!(err, RagError::Embedding(_)));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let corpus = Corpus::build(default_documents(), &HashingEmbeddings::new(32)).unwrap();
        let err = retrieve_top_k(&HashingEmbeddings::new(16), &corpus, "leave", 2).unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatch {
                expected: 32,
                actual: 16
            }
        ));
    }

    #[test]
    fn test_vacation_query_prefers_leave_document() {
        let embedder = HashingEmbeddings::new(384);
        let corpus = Corpus::build(default_documents(), &embedder).unwrap();
        let ranked =
            retrieve_top_k(&embedder, &corpus, "How many vacation days do I get?", 2).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].id(), "doc_0");
        assert_eq!(ranked[1].id(), "doc_2");
    }

    #[test]
    fn test_k_larger_than_corpus_returns_everything() {
        let embedder = HashingEmbeddings::new(384);
        let corpus = Corpus::build(default_documents(), &embedder).unwrap();
        let ranked =
            retrieve_top_k(&embedder, &corpus, "How many vacation days do I get?", 10).unwrap();
        // doc_1 and doc_3 share no terms with the query and tie at zero
        assert_eq!(ids(&ranked), vec!["doc_0", "doc_2", "doc_1", "doc_3"]);
    }

    #[test]
    fn test_unrelated_query_keeps_corpus_order() {
        let embedder = HashingEmbeddings::new(384);
        let corpus = Corpus::build(default_documents(), &embedder).unwrap();
        let ranked = retrieve_top_k(&embedder, &corpus, "xyzzy", 4).unwrap();
        assert!(ranked.iter().all(|r| r.score == 0.0));
        assert_eq!(ids(&ranked), vec!["doc_0", "doc_1", "doc_2", "doc_3"]);
    }

    #[test]
    fn test_empty_query_is_accepted() {
        let embedder = HashingEmbeddings::new(384);
        let corpus = Corpus::build(default_documents(), &embedder).unwrap();
        let ranked = retrieve_top_k(&embedder, &corpus, "", 2).unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let embedder = HashingEmbeddings::new(384);
        let corpus = Corpus::build(default_documents(), &embedder).unwrap();
        let query = "Can I work from home?";
        let first = retrieve_top_k(&embedder, &corpus, query, 4).unwrap();
        let second = retrieve_top_k(&embedder, &corpus, query, 4).unwrap();
        assert_eq!(ids(&first), ids(&second));
        let first_scores: Vec<f32> = first.iter().map(|s| s.score).collect();
        let second_scores: Vec<f32> = second.iter().map(|s| s.score).collect();
        assert_eq!(first_scores, second_scores);
    }

    fn documents(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| Document {
                id: i.to_string(),
                text: String::new(),
                embedding: Vec::new(),
            })
            .collect()
    }

    #[test]
    fn test_nan_score_does_not_break_ordering() {
        let docs = documents(3);
        let ranked = scored(&docs, &[0.1, f32::NAN, 0.9]);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![2, 0, 1]);
        assert!(ranked[2].1.is_nan());
    }

    #[test]
    fn test_negative_zero_ties_with_zero() {
        let docs = documents(3);
        let ranked = scored(&docs, &[0.0, -0.0, 0.0]);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    fn scored(docs: &[Document], scores: &[f32]) -> Vec<(usize, f32)> {
        let mut list: Vec<ScoredDocument<'_>> = docs
            .iter()
            .zip(scores)
            .map(|(document, &score)| ScoredDocument { document, score })
            .collect();
        rank(&mut list, docs.len());
        list.iter()
            .map(|s| (s.id().parse::<usize>().unwrap(), s.score))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_rank_length_order_and_stability(
            scores in prop::collection::vec(prop_oneof![Just(0.5f32), -1.0f32..1.0], 0..24),
            k in 0usize..32,
        ) {
            let docs = documents(scores.len());

            let full = scored(&docs, &scores);
            let mut list: Vec<ScoredDocument<'_>> = docs
                .iter()
                .zip(&scores)
                .map(|(document, &score)| ScoredDocument { document, score })
                .collect();
            rank(&mut list, k);

            prop_assert_eq!(list.len(), k.min(docs.len()));
            for pair in full.windows(2) {
                prop_assert!(pair[0].1 >= pair[1].1);
                if pair[0].1 == pair[1].1 {
                    prop_assert!(pair[0].0 < pair[1].0);
                }
            }
            let prefix: Vec<usize> = list.iter().map(|s| s.id().parse().unwrap()).collect();
            let expected: Vec<usize> = full.iter().take(k).map(|(i, _)| *i).collect();
            prop_assert_eq!(prefix, expected);
        }
    }
}
