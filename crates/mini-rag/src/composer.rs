//! Templated answers built from retrieved documents. No generation step:
//! the retrieved texts are joined and dropped into a fixed template.

use crate::types::RankedResult;

/// Fill the answer template with the query and the space-joined texts of
/// `ranked`, in retrieval order.
pub fn compose(query: &str, ranked: &RankedResult<'_>) -> String {
    let context_joined = ranked
        .iter()
        .map(|r| r.text())
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Question: {}\n\nBased on the company documents, here is the answer:\n{}\n",
        query, context_joined
    )
}

/// One display line per ranked document: `- id (score=0.123): text`.
pub fn format_ranked(ranked: &RankedResult<'_>) -> Vec<String> {
    ranked
        .iter()
        .map(|r| format!("- {} (score={:.3}): {}", r.id(), r.score, r.text()))
        .collect()
}
