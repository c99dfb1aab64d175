//! Per-parameter value generation

use super::spec::{ParamDomain, ParamSpec, ParamValue};
use rand::prelude::*;

/// Generates candidate values for one hyperparameter from its declared domain
#[derive(Debug, Clone)]
pub struct ValueGenerator {
    spec: ParamSpec,
}

impl ValueGenerator {
    /// Wrap a parameter spec
    pub fn new(spec: ParamSpec) -> Self {
        Self { spec }
    }

    /// The underlying spec
    pub fn spec(&self) -> &ParamSpec {
        &self.spec
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Number of distinct values this generator can produce, `None` if
    /// unbounded (a non-discretized float range)
    pub fn domain_size(&self) -> Option<u64> {
        match &self.spec.domain {
            ParamDomain::Discrete { options } => Some(options.len() as u64),
            ParamDomain::Float { min, max, steps, .. } => {
                if min == max {
                    Some(1)
                } else {
                    steps.map(|n| n as u64)
                }
            }
            ParamDomain::Long { min, max, steps, .. } => {
                if min == max {
                    Some(1)
                } else {
                    match steps {
                        Some(n) => Some(*n as u64),
                        None => Some((max - min) as u64 + 1),
                    }
                }
            }
        }
    }

    /// Draw one value from the domain
    ///
    /// Ranges draw uniformly; log-scaled ranges draw uniformly in log space
    /// and exponentiate back, preserving proportional density across orders
    /// of magnitude. Discretized ranges draw a grid index.
    pub fn sample(&self, rng: &mut impl Rng) -> ParamValue {
        match &self.spec.domain {
            ParamDomain::Discrete { options } => {
                let idx = rng.gen_range(0..options.len());
                options[idx].clone()
            }
            ParamDomain::Float { min, max, log_scale, steps } => {
                ParamValue::Float(sample_float(rng, *min, *max, *log_scale, *steps))
            }
            ParamDomain::Long { min, max, log_scale, steps } => {
                if min == max {
                    ParamValue::Long(*min)
                } else if steps.is_none() && !log_scale {
                    ParamValue::Long(rng.gen_range(*min..=*max))
                } else {
                    let val = sample_float(rng, *min as f64, *max as f64, *log_scale, *steps);
                    ParamValue::Long((val.round() as i64).clamp(*min, *max))
                }
            }
        }
    }
}

fn sample_float(rng: &mut impl Rng, min: f64, max: f64, log_scale: bool, steps: Option<usize>) -> f64 {
    if min == max {
        return min;
    }
    match steps {
        Some(n) if n > 1 => {
            let idx = rng.gen_range(0..n);
            grid_point(min, max, log_scale, idx, n)
        }
        Some(_) => min,
        None => {
            if log_scale {
                let (lo, hi) = (min.ln(), max.ln());
                (rng.gen::<f64>() * (hi - lo) + lo).exp()
            } else {
                rng.gen::<f64>() * (max - min) + min
            }
        }
    }
}

fn grid_point(min: f64, max: f64, log_scale: bool, idx: usize, n: usize) -> f64 {
    let t = idx as f64 / (n - 1) as f64;
    if log_scale {
        let (lo, hi) = (min.ln(), max.ln());
        (lo + t * (hi - lo)).exp()
    } else {
        min + t * (max - min)
    }
}
