//! Performance-based trainer weighting

use super::history::RunHistory;
use crate::pipeline::{OptimizeDirection, TrainerConfig};
use rand::prelude::*;

/// Convert run history into a sampling-weight vector over the active
/// trainers
///
/// Each trainer accumulates its scores (or `max - score` when minimizing),
/// averaged over its trial count. Untried trainers receive a +1 exploration
/// bonus so they are never starved. The result sums to 1 and is usable as a
/// categorical sampling distribution. Failed trials carry sentinel scores
/// and are skipped.
pub fn compute_weights(active: &[TrainerConfig], history: &RunHistory) -> Vec<f64> {
    let n = active.len();
    if n == 0 {
        return Vec::new();
    }

    let mut weights = vec![0.0; n];
    let mut counts = vec![0usize; n];

    let max_score = history
        .results()
        .iter()
        .filter(|r| r.succeeded && r.score.is_finite())
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);

    for result in history
        .results()
        .iter()
        .filter(|r| r.succeeded && r.score.is_finite())
    {
        let name = &result.candidate.trainer().name;
        if let Some(i) = active.iter().position(|t| &t.name == name) {
            weights[i] += match history.direction() {
                OptimizeDirection::Maximize => result.score,
                OptimizeDirection::Minimize => max_score - result.score,
            };
            counts[i] += 1;
        }
    }

    for i in 0..n {
        weights[i] /= counts[i].max(1) as f64;
        if counts[i] == 0 {
            weights[i] += 1.0;
        }
    }

    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
    } else {
        weights.fill(1.0 / n as f64);
    }
    weights
}

/// Draw `k` independent categorical samples (with replacement) from a
/// weight vector, returning trainer indices
pub fn sample_trainers(weights: &[f64], k: usize, rng: &mut impl Rng) -> Vec<usize> {
    if weights.is_empty() {
        return Vec::new();
    }
    let clamped: Vec<f64> = weights.iter().map(|w| w.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();

    (0..k)
        .map(|_| {
            if total <= 0.0 {
                return rng.gen_range(0..clamped.len());
            }
            let mut u = rng.gen::<f64>() * total;
            for (i, w) in clamped.iter().enumerate() {
                u -= w;
                if u <= 0.0 {
                    return i;
                }
            }
            clamped.len() - 1
        })
        .collect()
}
