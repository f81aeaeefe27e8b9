//! Retriever: similarity-gated lookup over the vector index.

use std::sync::Arc;
use tracing::debug;

use crate::services::vector_index::VectorIndex;

/// Returns only the hits whose score reaches `threshold`.
pub struct Retriever {
    index: Arc<VectorIndex>,
    threshold: f32,
}

impl Retriever {
    /// Retriever over `index` with a similarity threshold in [0, 1].
    pub fn new(index: Arc<VectorIndex>, threshold: f32) -> Self {
        Self { index, threshold }
    }

    /// At most `n_results` relevant texts, best first, or `None` when nothing
    /// clears the similarity threshold.
    pub async fn retrieve(&self, query: &str, n_results: usize) -> Option<Vec<String>> {
        let results = self.index.query(query, n_results, self.threshold).await;

        match results.first() {
            Some(top) if top.score >= self.threshold => {
                debug!(hits = results.len(), top_score = top.score, "Retrieved documents");
                Some(results.into_iter().take(n_results).map(|r| r.text).collect())
            }
            _ => {
                debug!(threshold = self.threshold, "No relevant documents");
                None
            }
        }
    }
}
