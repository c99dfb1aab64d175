//! Hyperparameter domains and values
//!
//! Provides the declared search domain of a single hyperparameter
//! ([`ParamSpec`]), assigned values ([`ParamValue`], [`ParameterSet`]) and
//! the per-parameter value generators used by sweepers.

mod generator;
mod spec;

pub use generator::ValueGenerator;
pub use spec::{ParamDomain, ParamSpec, ParamValue, ParameterSet};
