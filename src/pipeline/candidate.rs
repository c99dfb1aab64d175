//! Candidate pipelines and identity keys

use super::trainer::TrainerConfig;
use super::transform::{bitmask_of, TransformSpec, NORMALIZER_GROUP_ID};
use serde::{Deserialize, Serialize};

/// One fully specified, evaluatable pipeline configuration
///
/// Immutable after construction. The identity key is a deterministic function
/// of (trainer name, transform bitmask, non-default hyperparameters), so two
/// candidates with equal keys are duplicates regardless of how they were
/// constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    transforms: Vec<TransformSpec>,
    trainer: TrainerConfig,
    identity_key: String,
}

impl Candidate {
    /// Build a candidate from a transform set and a trainer configuration
    ///
    /// Both inputs are deep-cloned. If the trainer requires normalized
    /// numeric features and the set does not already contain the normalizer,
    /// it is appended before the identity key is computed, so it
    /// participates in the bitmask.
    pub fn build(transforms: &[TransformSpec], trainer: &TrainerConfig) -> Self {
        let mut transforms = transforms.to_vec();
        if trainer.needs_normalization
            && !transforms.iter().any(|t| t.group_id == NORMALIZER_GROUP_ID)
        {
            transforms.push(TransformSpec::normalizer());
        }

        let identity_key = format!(
            "{}+{}+{}",
            trainer.name,
            bitmask_of(&transforms),
            trainer.assigned_params().canonical_string(),
        );

        Self {
            transforms,
            trainer: trainer.clone(),
            identity_key,
        }
    }

    /// The transform set, including any auto-appended normalizer
    pub fn transforms(&self) -> &[TransformSpec] {
        &self.transforms
    }

    /// The trainer configuration
    pub fn trainer(&self) -> &TrainerConfig {
        &self.trainer
    }

    /// Canonical identity key used for deduplication
    pub fn identity_key(&self) -> &str {
        &self.identity_key
    }

    /// Human-readable description for the trial trace
    pub fn describe(&self) -> String {
        let transforms: Vec<&str> = self.transforms.iter().map(|t| t.name.as_str()).collect();
        let params = self.trainer.assigned_params();
        if params.is_empty() {
            format!("[{}] {} (defaults)", transforms.join(","), self.trainer.name)
        } else {
            format!(
                "[{}] {} {{{}}}",
                transforms.join(","),
                self.trainer.name,
                params.canonical_string(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParamSpec, ParamValue, ParameterSet};

    fn transforms() -> Vec<TransformSpec> {
        vec![
            TransformSpec::new("impute", 0),
            TransformSpec::new("onehot", 1),
        ]
    }

    fn trainer_with(lr: f64, depth: i64) -> TrainerConfig {
        let mut set = ParameterSet::new();
        set.insert("lr", ParamValue::Float(lr));
        set.insert("depth", ParamValue::Long(depth));
        TrainerConfig::new(
            "gbt",
            vec![
                ParamSpec::log_float("lr", 1e-3, 1.0),
                ParamSpec::long("depth", 2, 10),
            ],
        )
        .with_assignment(set)
    }

    #[test]
    fn test_identity_key_layout() {
        let trainer = TrainerConfig::new("knn", vec![]);
        let cand = Candidate::build(&transforms(), &trainer);
        assert_eq!(cand.identity_key(), "knn+3+");
    }

    #[test]
    fn test_identity_stable_across_reconstruction() {
        let a = Candidate::build(&transforms(), &trainer_with(0.1, 6));
        let b = Candidate::build(&transforms(), &trainer_with(0.1, 6));
        assert_eq!(a.identity_key(), b.identity_key());

        let cloned = a.clone();
        assert_eq!(cloned.identity_key(), a.identity_key());
    }

    #[test]
    fn test_identity_differs_on_params() {
        let a = Candidate::build(&transforms(), &trainer_with(0.1, 6));
        let b = Candidate::build(&transforms(), &trainer_with(0.2, 6));
        assert_ne!(a.identity_key(), b.identity_key());
    }

    #[test]
    fn test_normalizer_appended_and_in_bitmask() {
        let trainer = TrainerConfig::new("sgd", vec![]).with_normalization();
        let cand = Candidate::build(&transforms(), &trainer);

        assert!(cand
            .transforms()
            .iter()
            .any(|t| t.group_id == NORMALIZER_GROUP_ID));
        let mask: u64 = 0b11 | (1 << 63);
        assert_eq!(cand.identity_key(), format!("sgd+{mask}+"));
    }

    #[test]
    fn test_normalizer_not_duplicated() {
        let mut set = transforms();
        set.push(TransformSpec::normalizer());
        let trainer = TrainerConfig::new("sgd", vec![]).with_normalization();
        let cand = Candidate::build(&set, &trainer);

        let n = cand
            .transforms()
            .iter()
            .filter(|t| t.group_id == NORMALIZER_GROUP_ID)
            .count();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_build_deep_clones_inputs() {
        let trainer = trainer_with(0.1, 6);
        let cand = Candidate::build(&transforms(), &trainer);

        let mut mutated = trainer;
        if let Some(a) = mutated.assignment.as_mut() {
            a.insert("lr", ParamValue::Float(0.5));
        }

        assert_eq!(
            cand.trainer().assigned_params().get("lr").and_then(|v| v.as_float()),
            Some(0.1)
        );
    }
}
