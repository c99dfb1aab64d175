//! Run history and ranked score view

use crate::pipeline::{Candidate, OptimizeDirection};
use crate::sweep::SweepObservation;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Nudge applied to colliding scores in the ranked view
const SCORE_EPSILON: f64 = 1e-10;

/// Outcome of one evaluated trial
///
/// Append-only; a result's identity is its insertion position and it is
/// never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub candidate: Candidate,
    pub score: f64,
    pub succeeded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct RankKey(f64);

impl Eq for RankKey {}

impl PartialOrd for RankKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RankKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Ordered log of trial results plus a score-ranked index
///
/// The append-only sequence serves stage and weighting logic, which need
/// insertion order and trainer grouping; the ranked index serves best-so-far
/// queries. Exact score ties are kept by nudging the colliding key one
/// epsilon toward "worse" until unique, so no entry is dropped and rank-order
/// iteration reproduces insertion order for exact ties. The comparison
/// direction is fixed once for the whole session.
#[derive(Debug)]
pub struct RunHistory {
    direction: OptimizeDirection,
    results: Vec<RunResult>,
    ranked: BTreeMap<RankKey, usize>,
}

impl RunHistory {
    /// Create an empty history for the session's optimize direction
    pub fn new(direction: OptimizeDirection) -> Self {
        Self {
            direction,
            results: Vec::new(),
            ranked: BTreeMap::new(),
        }
    }

    /// The session's optimize direction
    pub fn direction(&self) -> OptimizeDirection {
        self.direction
    }

    /// Append a result; successful finite-scored results also enter the
    /// ranked view
    pub fn append(&mut self, result: RunResult) {
        let idx = self.results.len();
        if result.succeeded && result.score.is_finite() {
            let mut key = result.score;
            while self.ranked.contains_key(&RankKey(key)) {
                let nudged = match self.direction {
                    OptimizeDirection::Maximize => key - SCORE_EPSILON,
                    OptimizeDirection::Minimize => key + SCORE_EPSILON,
                };
                // Large magnitudes absorb the fixed epsilon; step to the
                // adjacent representable float so the key always moves.
                key = if nudged == key {
                    match self.direction {
                        OptimizeDirection::Maximize => key.next_down(),
                        OptimizeDirection::Minimize => key.next_up(),
                    }
                } else {
                    nudged
                };
            }
            self.ranked.insert(RankKey(key), idx);
        }
        self.results.push(result);
    }

    /// Number of recorded trials
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no trials have run
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// All results in insertion order
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }

    /// Successful results best-first
    pub fn ranked(&self) -> Vec<&RunResult> {
        let indices: Vec<usize> = match self.direction {
            OptimizeDirection::Maximize => self.ranked.values().rev().copied().collect(),
            OptimizeDirection::Minimize => self.ranked.values().copied().collect(),
        };
        indices.into_iter().map(|i| &self.results[i]).collect()
    }

    /// Insertion position of the best successful result, ties broken by
    /// earliest insertion
    pub fn best_index(&self) -> Option<usize> {
        match self.direction {
            OptimizeDirection::Maximize => self.ranked.values().next_back().copied(),
            OptimizeDirection::Minimize => self.ranked.values().next().copied(),
        }
    }

    /// The best successful result
    pub fn best(&self) -> Option<&RunResult> {
        self.best_index().map(|i| &self.results[i])
    }

    /// Observations for one trainer, in insertion order, as sweeper input
    pub fn trainer_observations(&self, trainer_name: &str) -> Vec<SweepObservation> {
        self.results
            .iter()
            .filter(|r| r.candidate.trainer().name == trainer_name)
            .map(|r| SweepObservation {
                params: r.candidate.trainer().assigned_params(),
                score: r.score,
                succeeded: r.succeeded,
            })
            .collect()
    }

    /// Best single score observed per trainer, in first-appearance order
    pub fn best_score_per_trainer(&self) -> Vec<(String, f64)> {
        let mut out: Vec<(String, f64)> = Vec::new();
        for r in &self.results {
            let name = &r.candidate.trainer().name;
            match out.iter_mut().find(|(n, _)| n == name) {
                Some((_, best)) => {
                    let better = match self.direction {
                        OptimizeDirection::Maximize => r.score > *best,
                        OptimizeDirection::Minimize => r.score < *best,
                    };
                    if better {
                        *best = r.score;
                    }
                }
                None => out.push((name.clone(), r.score)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{TrainerConfig, TransformSpec};

    fn result(trainer: &str, score: f64, succeeded: bool) -> RunResult {
        let candidate = Candidate::build(
            &[TransformSpec::new("impute", 0)],
            &TrainerConfig::new(trainer, vec![]),
        );
        RunResult {
            candidate,
            score,
            succeeded,
        }
    }

    #[test]
    fn test_score_collision_keeps_all_entries() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 0.75, true));
        history.append(result("b", 0.75, true));
        history.append(result("c", 0.75, true));

        let ranked = history.ranked();
        assert_eq!(ranked.len(), 3);
        // Rank order reproduces insertion order for exact ties
        let names: Vec<&str> = ranked
            .iter()
            .map(|r| r.candidate.trainer().name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_collision_nudge_terminates_on_large_scores() {
        // At this magnitude a 1e-10 subtraction is lost to f64 rounding, so
        // the collision keys have to advance float-by-float.
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 1e10, true));
        history.append(result("b", 1e10, true));
        history.append(result("c", 1e10, true));

        let names: Vec<&str> = history
            .ranked()
            .iter()
            .map(|r| r.candidate.trainer().name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(history.best_index(), Some(0));

        // RMSE-scale ties under minimization nudge the other way
        let mut history = RunHistory::new(OptimizeDirection::Minimize);
        history.append(result("a", 3.2e8, true));
        history.append(result("b", 3.2e8, true));
        assert_eq!(history.ranked().len(), 2);
        assert_eq!(history.best_index(), Some(0));
    }

    #[test]
    fn test_collision_order_minimize() {
        let mut history = RunHistory::new(OptimizeDirection::Minimize);
        history.append(result("a", 0.3, true));
        history.append(result("b", 0.3, true));

        let names: Vec<&str> = history
            .ranked()
            .iter()
            .map(|r| r.candidate.trainer().name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(history.best_index(), Some(0));
    }

    #[test]
    fn test_best_by_direction() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 0.6, true));
        history.append(result("b", 0.9, true));
        history.append(result("c", 0.7, true));

        assert_eq!(history.best_index(), Some(1));
        assert_eq!(history.best().unwrap().score, 0.9);

        let mut history = RunHistory::new(OptimizeDirection::Minimize);
        history.append(result("a", 0.6, true));
        history.append(result("b", 0.2, true));
        assert_eq!(history.best_index(), Some(1));
    }

    #[test]
    fn test_best_ties_broken_by_earliest() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 0.8, true));
        history.append(result("b", 0.8, true));
        assert_eq!(history.best_index(), Some(0));
    }

    #[test]
    fn test_failed_runs_excluded_from_ranking() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", f64::NEG_INFINITY, false));
        history.append(result("b", 0.5, true));

        assert_eq!(history.len(), 2);
        assert_eq!(history.ranked().len(), 1);
        assert_eq!(history.best_index(), Some(1));
    }

    #[test]
    fn test_best_score_per_trainer() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 0.80, true));
        history.append(result("b", 0.60, true));
        history.append(result("b", 0.85, true));
        history.append(result("c", 0.40, true));

        let best = history.best_score_per_trainer();
        assert_eq!(
            best,
            vec![
                ("a".to_string(), 0.80),
                ("b".to_string(), 0.85),
                ("c".to_string(), 0.40),
            ]
        );
    }

    #[test]
    fn test_trainer_observations_filtering() {
        let mut history = RunHistory::new(OptimizeDirection::Maximize);
        history.append(result("a", 0.8, true));
        history.append(result("b", 0.6, false));
        history.append(result("a", 0.7, true));

        let obs = history.trainer_observations("a");
        assert_eq!(obs.len(), 2);
        assert!(obs.iter().all(|o| o.succeeded));
    }
}
