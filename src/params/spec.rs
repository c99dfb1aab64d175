//! Hyperparameter specifications and assigned values

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Declared domain of a single hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamDomain {
    /// Fixed finite option list
    Discrete { options: Vec<ParamValue> },
    /// Continuous float range, optionally log-scaled and/or discretized
    Float {
        min: f64,
        max: f64,
        log_scale: bool,
        steps: Option<usize>,
    },
    /// Integer range, optionally log-scaled and/or discretized
    Long {
        min: i64,
        max: i64,
        log_scale: bool,
        steps: Option<usize>,
    },
}

/// A single named hyperparameter with its domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub domain: ParamDomain,
}

impl ParamSpec {
    /// Create a discrete parameter from a fixed option list
    pub fn discrete(name: impl Into<String>, options: Vec<ParamValue>) -> Self {
        Self {
            name: name.into(),
            domain: ParamDomain::Discrete { options },
        }
    }

    /// Create a float range parameter
    pub fn float(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            domain: ParamDomain::Float {
                min,
                max,
                log_scale: false,
                steps: None,
            },
        }
    }

    /// Create a log-scale float range parameter
    pub fn log_float(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            domain: ParamDomain::Float {
                min,
                max,
                log_scale: true,
                steps: None,
            },
        }
    }

    /// Create an integer range parameter
    pub fn long(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            domain: ParamDomain::Long {
                min,
                max,
                log_scale: false,
                steps: None,
            },
        }
    }

    /// Create a log-scale integer range parameter
    pub fn log_long(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            name: name.into(),
            domain: ParamDomain::Long {
                min,
                max,
                log_scale: true,
                steps: None,
            },
        }
    }

    /// Discretize a range into `n` evenly spaced points
    pub fn with_steps(mut self, n: usize) -> Self {
        match &mut self.domain {
            ParamDomain::Float { steps, .. } | ParamDomain::Long { steps, .. } => {
                *steps = Some(n.max(1));
            }
            ParamDomain::Discrete { .. } => {}
        }
        self
    }

    /// Check that the domain can actually be sampled
    ///
    /// Rejects empty option lists, inverted ranges, and log-scale ranges
    /// with a non-positive minimum (their log-space bounds are undefined).
    pub fn validate(&self) -> Result<()> {
        let invalid = |value: String, reason: &str| {
            Err(SearchError::InvalidParameter {
                name: self.name.clone(),
                value,
                reason: reason.to_string(),
            })
        };
        match &self.domain {
            ParamDomain::Discrete { options } => {
                if options.is_empty() {
                    return invalid("[]".to_string(), "discrete domain has no options");
                }
            }
            ParamDomain::Float { min, max, log_scale, .. } => {
                if min > max {
                    return invalid(format!("{min}..{max}"), "range is empty");
                }
                if *log_scale && *min <= 0.0 {
                    return invalid(min.to_string(), "log-scale range requires min > 0");
                }
            }
            ParamDomain::Long { min, max, log_scale, .. } => {
                if min > max {
                    return invalid(format!("{min}..{max}"), "range is empty");
                }
                if *log_scale && *min <= 0 {
                    return invalid(min.to_string(), "log-scale range requires min > 0");
                }
            }
        }
        Ok(())
    }

    /// Discretize a range into points spaced by `step`
    ///
    /// Normalized to an equivalent step count so samplers deal with a single
    /// representation.
    pub fn with_step_size(mut self, step: f64) -> Self {
        match &mut self.domain {
            ParamDomain::Float { min, max, steps, .. } => {
                if step > 0.0 && *max > *min {
                    *steps = Some(((*max - *min) / step).floor() as usize + 1);
                }
            }
            ParamDomain::Long { min, max, steps, .. } => {
                if step >= 1.0 && *max > *min {
                    *steps = Some(((*max - *min) as f64 / step).floor() as usize + 1);
                }
            }
            ParamDomain::Discrete { .. } => {}
        }
        self
    }
}

/// A concrete hyperparameter value, retaining its raw numeric form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Float(f64),
    Long(i64),
    Text(String),
}

impl ParamValue {
    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get as integer
    pub fn as_long(&self) -> Option<i64> {
        match self {
            ParamValue::Long(v) => Some(*v),
            ParamValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Long(v) => write!(f, "{v}"),
            ParamValue::Text(v) => write!(f, "{v}"),
        }
    }
}

/// An assignment of values to named hyperparameters
///
/// Keys are unique; iteration is lexicographic by name, which makes the
/// canonical form order-independent with respect to construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    values: BTreeMap<String, ParamValue>,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    /// Get a value by name
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Iterate entries in lexicographic name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    /// Number of assigned parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no parameters are assigned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Canonical `name=value;` concatenation in lexicographic name order
    pub fn canonical_string(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.values {
            out.push_str(name);
            out.push('=');
            out.push_str(&value.to_string());
            out.push(';');
        }
        out
    }
}

impl FromIterator<(String, ParamValue)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builders() {
        let spec = ParamSpec::log_float("learning_rate", 1e-4, 1e-1);
        assert!(matches!(
            spec.domain,
            ParamDomain::Float { log_scale: true, .. }
        ));

        let spec = ParamSpec::long("n_estimators", 10, 1000).with_steps(20);
        assert!(matches!(
            spec.domain,
            ParamDomain::Long { steps: Some(20), .. }
        ));
    }

    #[test]
    fn test_validate_rejects_empty_options() {
        let err = ParamSpec::discrete("kernel", vec![]).validate().unwrap_err();
        assert!(matches!(err, SearchError::InvalidParameter { .. }));

        let ok = ParamSpec::discrete("kernel", vec![ParamValue::Text("rbf".to_string())]);
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unsampleable_ranges() {
        assert!(ParamSpec::log_float("lr", 0.0, 1.0).validate().is_err());
        assert!(ParamSpec::log_long("n", 0, 10).validate().is_err());
        assert!(ParamSpec::float("x", 2.0, 1.0).validate().is_err());

        assert!(ParamSpec::log_float("lr", 1e-4, 1.0).validate().is_ok());
        assert!(ParamSpec::long("depth", 2, 10).validate().is_ok());
    }

    #[test]
    fn test_step_size_normalization() {
        let spec = ParamSpec::float("dropout", 0.0, 0.5).with_step_size(0.1);
        // 0.0, 0.1, ..., 0.5
        assert!(matches!(
            spec.domain,
            ParamDomain::Float { steps: Some(6), .. }
        ));
    }

    #[test]
    fn test_canonical_string_order_independent() {
        let mut a = ParameterSet::new();
        a.insert("lr", ParamValue::Float(0.1));
        a.insert("depth", ParamValue::Long(6));

        let mut b = ParameterSet::new();
        b.insert("depth", ParamValue::Long(6));
        b.insert("lr", ParamValue::Float(0.1));

        assert_eq!(a.canonical_string(), b.canonical_string());
        assert_eq!(a.canonical_string(), "depth=6;lr=0.1;");
        assert_eq!(a, b);
    }

    #[test]
    fn test_insert_replaces() {
        let mut set = ParameterSet::new();
        set.insert("lr", ParamValue::Float(0.1));
        set.insert("lr", ParamValue::Float(0.2));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("lr").and_then(|v| v.as_float()), Some(0.2));
    }
}
