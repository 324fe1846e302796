//! Blended cosine scoring and top-K selection
//!
//! Both matrices hold unit-length rows, so cosine similarity against a
//! normalized query is a plain dot product. The two similarity vectors are
//! blended into one score per corpus row.

use std::cmp::Ordering;

use crate::embeddings::{dot, EmbeddingMatrix};

/// Blend overview and situation similarities into one score per row
///
/// `overview_query` and `situation_query` must already be normalized and match
/// their matrix's dimension.
pub fn blended_scores(
    overview: &EmbeddingMatrix,
    situation: &EmbeddingMatrix,
    overview_query: &[f32],
    situation_query: &[f32],
    overview_weight: f32,
    situation_weight: f32,
) -> Vec<f32> {
    overview
        .iter_rows()
        .zip(situation.iter_rows())
        .map(|(o, s)| {
            overview_weight * dot(o, overview_query)
                + situation_weight * dot(s, situation_query)
        })
        .collect()
}

/// Ranking order: higher score first, lower row index on ties
///
/// NaN scores rank below every real score.
fn rank_order(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    rank_key(b.1)
        .partial_cmp(&rank_key(a.1))
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.cmp(&b.0))
}

fn rank_key(score: f32) -> f32 {
    if score.is_nan() {
        f32::NEG_INFINITY
    } else {
        score
    }
}

/// Indices and scores of the `k` best rows, best first
///
/// Partitions around the k-th element and sorts only the selected prefix.
pub fn top_k(scores: &[f32], k: usize) -> Vec<(usize, f32)> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    if k < ranked.len() {
        ranked.select_nth_unstable_by(k - 1, rank_order);
        ranked.truncate(k);
    }
    ranked.sort_unstable_by(rank_order);
    ranked
}
