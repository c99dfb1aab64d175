//! Trainer configuration templates

use crate::params::{ParamSpec, ParameterSet};
use serde::{Deserialize, Serialize};

/// A model-fitting algorithm with its declared hyperparameter domain and an
/// optional concrete assignment
///
/// A `TrainerConfig` is exclusively owned by the candidate holding it. All
/// fields are owned values, so `Clone` is a deep clone; reusing a config as
/// a template for a new candidate always goes through a clone, and mutating
/// one candidate's hyperparameters never affects another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    pub name: String,
    pub params: Vec<ParamSpec>,
    pub assignment: Option<ParameterSet>,
    pub needs_normalization: bool,
}

impl TrainerConfig {
    /// Create a trainer template with default (unassigned) hyperparameters
    pub fn new(name: impl Into<String>, params: Vec<ParamSpec>) -> Self {
        Self {
            name: name.into(),
            params,
            assignment: None,
            needs_normalization: false,
        }
    }

    /// Declare that this trainer requires normalized numeric features
    pub fn with_normalization(mut self) -> Self {
        self.needs_normalization = true;
        self
    }

    /// Set a concrete hyperparameter assignment
    pub fn with_assignment(mut self, assignment: ParameterSet) -> Self {
        self.assignment = if assignment.is_empty() {
            None
        } else {
            Some(assignment)
        };
        self
    }

    /// Assigned, i.e. non-default, hyperparameters
    pub fn assigned_params(&self) -> ParameterSet {
        self.assignment.clone().unwrap_or_default()
    }

    /// Whether this trainer declares any tunable hyperparameters
    pub fn has_params(&self) -> bool {
        !self.params.is_empty()
    }
}
