//! Hyperparameter sweeping strategies
//!
//! A [`Sweeper`] proposes new hyperparameter assignments from a set of value
//! generators, informed by prior (parameter-set, score) observations. All
//! sweepers honor the novelty-retry contract: each proposal is resampled up
//! to a retry budget until it differs from every prior observation and from
//! earlier proposals in the same call; when retries exhaust, the last sample
//! is accepted anyway so the search keeps making progress.

use crate::params::{ParamDomain, ParamSpec, ParamValue, ParameterSet, ValueGenerator};
use crate::pipeline::OptimizeDirection;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

/// Default per-proposal resample budget
pub const DEFAULT_RETRIES: usize = 10;

const POPULATION_SIZE: usize = 20;

/// One prior observation available to a sweeper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepObservation {
    pub params: ParameterSet,
    pub score: f64,
    pub succeeded: bool,
}

/// Proposes new hyperparameter assignments
pub trait Sweeper: Send {
    /// Propose up to `count` new parameter sets given prior observations
    fn propose_sweeps(
        &mut self,
        count: usize,
        history: &[SweepObservation],
    ) -> Vec<ParameterSet>;
}

/// Create the sweeper appropriate for a trainer's hyperparameter domain
pub fn create_sweeper(
    params: &[ParamSpec],
    direction: OptimizeDirection,
    seed: Option<u64>,
) -> Box<dyn Sweeper> {
    if params.is_empty() {
        Box::new(NoOpSweeper)
    } else {
        Box::new(PopulationSweeper::new(params.to_vec(), direction, seed))
    }
}

fn seeded_rng(seed: Option<u64>) -> Xoshiro256PlusPlus {
    match seed {
        Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
        None => Xoshiro256PlusPlus::from_entropy(),
    }
}

fn sample_set(generators: &[ValueGenerator], rng: &mut impl Rng) -> ParameterSet {
    generators
        .iter()
        .map(|g| (g.name().to_string(), g.sample(rng)))
        .collect()
}

fn is_duplicate(
    candidate: &ParameterSet,
    history: &[SweepObservation],
    proposed: &[ParameterSet],
) -> bool {
    history.iter().any(|o| &o.params == candidate) || proposed.contains(candidate)
}

/// Run the novelty-retry loop around a sampling closure
fn propose_unique(
    count: usize,
    retries: usize,
    history: &[SweepObservation],
    mut sample: impl FnMut() -> ParameterSet,
) -> Vec<ParameterSet> {
    let mut out: Vec<ParameterSet> = Vec::with_capacity(count);
    for _ in 0..count {
        let mut candidate = sample();
        for _ in 1..retries.max(1) {
            if !is_duplicate(&candidate, history, &out) {
                break;
            }
            candidate = sample();
        }
        out.push(candidate);
    }
    out
}

/// Samples independently and identically from each value generator,
/// ignoring history beyond the novelty check
pub struct RandomSweeper {
    generators: Vec<ValueGenerator>,
    rng: Xoshiro256PlusPlus,
    retries: usize,
}

impl RandomSweeper {
    /// Create a new random sweeper over the given parameter domains
    pub fn new(params: Vec<ParamSpec>, seed: Option<u64>) -> Self {
        Self {
            generators: params.into_iter().map(ValueGenerator::new).collect(),
            rng: seeded_rng(seed),
            retries: DEFAULT_RETRIES,
        }
    }

    /// Override the per-proposal retry budget
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }
}

impl Sweeper for RandomSweeper {
    fn propose_sweeps(
        &mut self,
        count: usize,
        history: &[SweepObservation],
    ) -> Vec<ParameterSet> {
        let generators = &self.generators;
        let rng = &mut self.rng;
        propose_unique(count, self.retries, history, || {
            sample_set(generators, &mut *rng)
        })
    }
}

/// Constant sweeper for trainers with zero hyperparameters
pub struct NoOpSweeper;

impl Sweeper for NoOpSweeper {
    fn propose_sweeps(
        &mut self,
        count: usize,
        _history: &[SweepObservation],
    ) -> Vec<ParameterSet> {
        vec![ParameterSet::new(); count]
    }
}

/// Population-based sweeper
///
/// Maintains a population seeded at construction and refines it with scored
/// history: as observations accumulate, proposals increasingly come from
/// perturbing top-quantile prior points inside a shrinking neighborhood of
/// each numeric domain, and accepted perturbations displace population
/// members, pulling the population toward promising regions.
pub struct PopulationSweeper {
    generators: Vec<ValueGenerator>,
    rng: Xoshiro256PlusPlus,
    retries: usize,
    direction: OptimizeDirection,
    population: Vec<ParameterSet>,
    exploit_cap: f64,
}

impl PopulationSweeper {
    /// Create a new population sweeper over the given parameter domains
    pub fn new(params: Vec<ParamSpec>, direction: OptimizeDirection, seed: Option<u64>) -> Self {
        let generators: Vec<ValueGenerator> =
            params.into_iter().map(ValueGenerator::new).collect();
        let mut rng = seeded_rng(seed);
        let population = (0..POPULATION_SIZE)
            .map(|_| sample_set(&generators, &mut rng))
            .collect();
        Self {
            generators,
            rng,
            retries: DEFAULT_RETRIES,
            direction,
            population,
            exploit_cap: 0.8,
        }
    }

    /// Override the per-proposal retry budget
    pub fn with_retries(mut self, retries: usize) -> Self {
        self.retries = retries;
        self
    }

    fn next_candidate(&mut self, history: &[SweepObservation]) -> ParameterSet {
        let successes: Vec<&SweepObservation> = history
            .iter()
            .filter(|o| o.succeeded && o.score.is_finite())
            .collect();

        if successes.is_empty() {
            // Drain the seeded population before falling back to fresh draws
            if let Some(seeded) = self.population.pop() {
                return seeded;
            }
            return sample_set(&self.generators, &mut self.rng);
        }

        let exploit = (history.len() as f64 / 20.0).min(self.exploit_cap);
        if self.rng.gen::<f64>() < exploit {
            let elite = self.pick_elite(&successes);
            let child = self.perturb(&elite, history.len());
            if !self.population.is_empty() {
                let slot = self.rng.gen_range(0..self.population.len());
                self.population[slot] = child.clone();
            }
            child
        } else {
            sample_set(&self.generators, &mut self.rng)
        }
    }

    fn pick_elite(&mut self, successes: &[&SweepObservation]) -> ParameterSet {
        let mut sorted: Vec<&SweepObservation> = successes.to_vec();
        sorted.sort_by(|a, b| match self.direction {
            OptimizeDirection::Maximize => b.score.total_cmp(&a.score),
            OptimizeDirection::Minimize => a.score.total_cmp(&b.score),
        });
        let quantile = (sorted.len() + 3) / 4;
        let idx = self.rng.gen_range(0..quantile.max(1));
        sorted[idx].params.clone()
    }

    /// Resample each parameter near the elite value; the neighborhood
    /// shrinks as history accumulates
    fn perturb(&mut self, elite: &ParameterSet, n_history: usize) -> ParameterSet {
        let radius = (0.5 * (1.0 - n_history as f64 / 50.0)).max(0.05);
        let mut out = ParameterSet::new();
        for gen in &self.generators {
            let value = match (&gen.spec().domain, elite.get(gen.name())) {
                (
                    ParamDomain::Float { min, max, log_scale, steps: None },
                    Some(ParamValue::Float(center)),
                ) => {
                    let v = local_draw(&mut self.rng, *center, *min, *max, *log_scale, radius);
                    ParamValue::Float(v)
                }
                (
                    ParamDomain::Long { min, max, log_scale, steps: None },
                    Some(ParamValue::Long(center)),
                ) => {
                    let v = local_draw(
                        &mut self.rng,
                        *center as f64,
                        *min as f64,
                        *max as f64,
                        *log_scale,
                        radius,
                    );
                    ParamValue::Long((v.round() as i64).clamp(*min, *max))
                }
                // Discrete and gridded params mutate with small probability
                (_, Some(kept)) => {
                    if self.rng.gen::<f64>() < 0.3 {
                        gen.sample(&mut self.rng)
                    } else {
                        kept.clone()
                    }
                }
                (_, None) => gen.sample(&mut self.rng),
            };
            out.insert(gen.name().to_string(), value);
        }
        out
    }
}

fn local_draw(
    rng: &mut impl Rng,
    center: f64,
    min: f64,
    max: f64,
    log_scale: bool,
    radius: f64,
) -> f64 {
    if min == max {
        return min;
    }
    let (lo, hi, c) = if log_scale {
        (min.ln(), max.ln(), center.max(min).ln())
    } else {
        (min, max, center)
    };
    let span = (hi - lo) * radius;
    let v = rng.gen::<f64>() * 2.0 * span + (c - span);
    let v = v.clamp(lo, hi);
    if log_scale {
        v.exp()
    } else {
        v
    }
}

impl Sweeper for PopulationSweeper {
    fn propose_sweeps(
        &mut self,
        count: usize,
        history: &[SweepObservation],
    ) -> Vec<ParameterSet> {
        let mut out: Vec<ParameterSet> = Vec::with_capacity(count);
        for _ in 0..count {
            let mut candidate = self.next_candidate(history);
            for _ in 1..self.retries.max(1) {
                if !is_duplicate(&candidate, history, &out) {
                    break;
                }
                candidate = self.next_candidate(history);
            }
            out.push(candidate);
        }
        out
    }
}
