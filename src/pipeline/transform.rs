//! Feature transform references

use serde::{Deserialize, Serialize};

/// Group id reserved for the normalization transform appended when a trainer
/// requires normalized numeric features
pub const NORMALIZER_GROUP_ID: u32 = 63;

/// Opaque reference to a feature transform supplied by the external
/// transform-inference collaborator
///
/// The stable `group_id` places the transform in the candidate identity
/// bitmask (`bit = 1 << group_id`), so it must be below 64 and stable across
/// a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSpec {
    pub name: String,
    pub group_id: u32,
}

impl TransformSpec {
    /// Create a transform reference
    pub fn new(name: impl Into<String>, group_id: u32) -> Self {
        Self {
            name: name.into(),
            group_id,
        }
    }

    /// The normalization transform appended for trainers that require
    /// normalized numeric features
    pub fn normalizer() -> Self {
        Self::new("normalize", NORMALIZER_GROUP_ID)
    }

    /// Bit this transform contributes to the candidate bitmask
    ///
    /// Group ids at or above 64 do not fit the mask; the session rejects
    /// them before any candidate is built.
    pub fn bit(&self) -> u64 {
        debug_assert!(
            self.group_id < 64,
            "transform group id {} outside the 64-bit identity mask",
            self.group_id
        );
        1u64 << (self.group_id % 64)
    }
}

/// Bitmask identifying which transform groups are included in a set
pub fn bitmask_of(transforms: &[TransformSpec]) -> u64 {
    transforms.iter().fold(0u64, |mask, t| mask | t.bit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bitmask() {
        let transforms = vec![
            TransformSpec::new("impute", 0),
            TransformSpec::new("onehot", 2),
        ];
        assert_eq!(bitmask_of(&transforms), 0b101);
    }

    #[test]
    fn test_bitmask_ignores_order() {
        let a = vec![TransformSpec::new("a", 1), TransformSpec::new("b", 3)];
        let b = vec![TransformSpec::new("b", 3), TransformSpec::new("a", 1)];
        assert_eq!(bitmask_of(&a), bitmask_of(&b));
    }

    #[test]
    fn test_normalizer_bit_is_reserved() {
        let norm = TransformSpec::normalizer();
        assert_eq!(norm.group_id, NORMALIZER_GROUP_ID);
        assert_eq!(norm.bit(), 1u64 << 63);
    }
}
