//! External collaborator interfaces

use super::candidate::Candidate;
use super::task::TaskKind;
use super::trainer::TrainerConfig;
use super::transform::TransformSpec;
use serde::{Deserialize, Serialize};

/// Supplies the pool of candidate feature transforms, inferred from the raw
/// input data by an external collaborator
pub trait TransformInference {
    fn available_transforms(&self) -> Vec<TransformSpec>;
}

/// Supplies trainer templates for a task kind
///
/// `max_iterations_hint` lets the catalog trim expensive trainers when the
/// trial budget is small.
pub trait TrainerCatalog {
    fn available_trainers(&self, task: TaskKind, max_iterations_hint: usize) -> Vec<TrainerConfig>;
}

/// Outcome of evaluating one candidate pipeline
///
/// A tagged value rather than an error: per-trial failure is expected
/// control flow for the search loop and never aborts a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Evaluation {
    Success { score: f64 },
    Failure { reason: String },
}

/// Trains and scores a materialized candidate pipeline
///
/// Implementations own their train/validation data; the engine only hands
/// over the candidate configuration.
pub trait Evaluator {
    fn evaluate(&mut self, candidate: &Candidate) -> Evaluation;
}

impl<F> Evaluator for F
where
    F: FnMut(&Candidate) -> Evaluation,
{
    fn evaluate(&mut self, candidate: &Candidate) -> Evaluation {
        self(candidate)
    }
}
