//! Maximal Marginal Relevance retrieval over a vector store.
//!
//! The [`Retriever`] embeds the question, fetches `fetch_k` nearest
//! neighbours, keeps the candidates above the score floor, and selects up
//! to `k` of them by MMR so the context passed to the generator is both
//! relevant and non-redundant.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RetrieverParams;
use crate::document::RetrievedDoc;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::{VectorStore, cosine_similarity};

/// Retrieves chunks relevant to a question from one collection.
pub struct Retriever {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    params: RetrieverParams,
}

impl Retriever {
    /// Create a retriever over the given store and embedder.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        params: RetrieverParams,
    ) -> Self {
        Self { store, embedder, params }
    }

    /// Return up to `k` relevant chunks for the question.
    ///
    /// An empty result is not an error; it means nothing in the collection
    /// cleared the score floor.
    pub async fn retrieve(&self, collection: &str, question: &str) -> Result<Vec<RetrievedDoc>> {
        let query_embedding = self.embedder.embed(question).await?;
        let candidates =
            self.store.search(collection, &query_embedding, self.params.fetch_k).await?;

        debug!(collection, fetched = candidates.len(), "fetched nearest neighbours");

        let selected = mmr_select(
            &query_embedding,
            candidates,
            self.params.k,
            self.params.lambda_mult,
            self.params.score_threshold,
        );

        info!(collection, selected = selected.len(), "retrieval completed");
        Ok(selected)
    }
}

/// Select up to `k` documents by Maximal Marginal Relevance.
///
/// Candidates below `score_floor` (query similarity as reported by the
/// store) are discarded, as are duplicate chunk ids. Each round picks the
/// candidate maximizing `λ·sim(c, q) − (1−λ)·max_{s∈selected} sim(c, s)`;
/// ties are broken by higher query similarity, then by insertion order.
pub(crate) fn mmr_select(
    query_embedding: &[f32],
    candidates: Vec<RetrievedDoc>,
    k: usize,
    lambda: f32,
    score_floor: f32,
) -> Vec<RetrievedDoc> {
    let mut seen = HashSet::new();
    let eligible: Vec<RetrievedDoc> = candidates
        .into_iter()
        .filter(|doc| doc.score >= score_floor && seen.insert(doc.chunk.id.clone()))
        .collect();

    if eligible.is_empty() || k == 0 {
        return Vec::new();
    }

    // Recompute query similarity locally when the backend returned the
    // embedding; otherwise trust the store's reported score.
    let query_sims: Vec<f32> = eligible
        .iter()
        .map(|doc| {
            if doc.chunk.embedding.is_empty() {
                doc.score
            } else {
                cosine_similarity(&doc.chunk.embedding, query_embedding)
            }
        })
        .collect();

    let mut remaining: Vec<usize> = (0..eligible.len()).collect();
    let mut selected_indices: Vec<usize> = Vec::with_capacity(k.min(eligible.len()));

    while selected_indices.len() < k && !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_mmr = f32::NEG_INFINITY;
        let mut best_sim = f32::NEG_INFINITY;

        for (pos, &idx) in remaining.iter().enumerate() {
            let redundancy = selected_indices
                .iter()
                .map(|&s| {
                    if eligible[idx].chunk.embedding.is_empty()
                        || eligible[s].chunk.embedding.is_empty()
                    {
                        0.0
                    } else {
                        cosine_similarity(&eligible[idx].chunk.embedding, &eligible[s].chunk.embedding)
                    }
                })
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if redundancy == f32::NEG_INFINITY { 0.0 } else { redundancy };

            let mmr = lambda * query_sims[idx] - (1.0 - lambda) * redundancy;

            // Strict comparisons keep the earliest candidate on full ties.
            if mmr > best_mmr || (mmr == best_mmr && query_sims[idx] > best_sim) {
                best_mmr = mmr;
                best_sim = query_sims[idx];
                best_pos = pos;
            }
        }

        selected_indices.push(remaining.remove(best_pos));
    }

    let mut by_index: Vec<Option<RetrievedDoc>> = eligible.into_iter().map(Some).collect();
    selected_indices
        .into_iter()
        .filter_map(|idx| by_index[idx].take())
        .collect()
}
