//! Budget estimation from matched projects
//!
//! Matches are weighted by a temperature softmax over their similarities, and
//! the estimate is the weighted geometric mean of their budgets. Working in
//! log space keeps a single very large historical budget from dominating.

/// Guards the softmax normalization against a zero sum
pub const SOFTMAX_EPSILON: f64 = 1e-12;

/// Softmax of `scores / temperature`, shifted by the max for stability
pub fn softmax(scores: &[f64], temperature: f64) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let scaled: Vec<f64> = scores.iter().map(|s| s / temperature).collect();
    let max = scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|z| (z - max).exp()).collect();
    let sum: f64 = exps.iter().sum::<f64>() + SOFTMAX_EPSILON;

    exps.into_iter().map(|e| e / sum).collect()
}

/// Weighted geometric mean `exp(Σ wᵢ·ln vᵢ)` over positive finite values
///
/// Pairs with a non-positive or non-finite value, or a non-finite weight, are
/// skipped and the remaining weights renormalized. Returns `None` when nothing
/// usable remains or the result is not finite.
pub fn weighted_log_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    let usable: Vec<(f64, f64)> = values
        .iter()
        .zip(weights)
        .filter(|(v, w)| v.is_finite() && **v > 0.0 && w.is_finite())
        .map(|(v, w)| (*v, *w))
        .collect();

    let total_weight: f64 = usable.iter().map(|(_, w)| w).sum();
    if usable.is_empty() || total_weight <= 0.0 {
        return None;
    }

    let log_mean: f64 = usable
        .iter()
        .map(|(v, w)| (w / total_weight) * v.ln())
        .sum();

    Some(log_mean.exp()).filter(|e| e.is_finite())
}

/// Estimate a budget from `(similarity, budget)` pairs of usable matches
pub fn estimate_budget(matches: &[(f32, f64)], temperature: f64) -> Option<f64> {
    if matches.is_empty() {
        return None;
    }

    let similarities: Vec<f64> = matches.iter().map(|(s, _)| f64::from(*s)).collect();
    let budgets: Vec<f64> = matches.iter().map(|(_, b)| *b).collect();

    let weights = softmax(&similarities, temperature);
    weighted_log_mean(&budgets, &weights)
}
