//! Staged search engine state machine

use super::dedup::DedupGuard;
use super::history::RunHistory;
use super::weighting::{compute_weights, sample_trainers};
use crate::pipeline::{Candidate, OptimizeDirection, TrainerConfig, TransformSpec};
use crate::sweep::{create_sweeper, Sweeper};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Trainers kept after the first stage
pub const TOP_K: usize = 3;
/// Sweep trials per surviving trainer in the second stage
pub const SECOND_STAGE_TRIALS_PER_TRAINER: usize = 5;
/// Construction attempts before a candidate slot gives up on novelty
pub const MAX_CANDIDATE_ATTEMPTS: usize = 10;

/// Stage of the staged search engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStage {
    /// Exploration baseline: every trainer once, defaults, full transforms
    First,
    /// Focused exploration: sweeping the top-K trainers
    Second,
    /// Refinement: steady state until the terminator fires
    Third,
}

/// Tunables of the staged engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedSearchConfig {
    pub top_k: usize,
    pub trials_per_trainer: usize,
    pub max_candidate_attempts: usize,
    /// Overrides the first-stage trial count when randomized initialization
    /// is configured; trainers are cycled in supplied order
    pub first_stage_trials: Option<usize>,
    pub seed: Option<u64>,
}

impl Default for StagedSearchConfig {
    fn default() -> Self {
        Self {
            top_k: TOP_K,
            trials_per_trainer: SECOND_STAGE_TRIALS_PER_TRAINER,
            max_candidate_attempts: MAX_CANDIDATE_ATTEMPTS,
            first_stage_trials: None,
            seed: None,
        }
    }
}

/// Capability interface of interchangeable search strategies
pub trait PipelineSearcher {
    /// Supply the transform pool and trainer templates for the session
    fn set_search_space(&mut self, transforms: Vec<TransformSpec>, trainers: Vec<TrainerConfig>);

    /// Propose up to `batch_size` candidates given accumulated history
    fn get_next_candidates(&mut self, history: &RunHistory, batch_size: usize) -> Vec<Candidate>;

    /// Re-draw `k` active trainers from the performance-weighted
    /// distribution over the current active set
    fn update_active_trainers(&mut self, history: &RunHistory, k: usize);
}

/// Enumerates every trainer once with default hyperparameters and the full
/// transform set, in supplied order
#[derive(Debug, Default)]
pub struct DefaultsOnlySearch {
    transforms: Vec<TransformSpec>,
    trainers: Vec<TrainerConfig>,
    issued: usize,
    quota: Option<usize>,
}

impl DefaultsOnlySearch {
    /// Create an empty searcher; call `set_search_space` before use
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the trial quota; trainers are cycled when it exceeds the
    /// trainer count
    pub fn set_quota(&mut self, quota: Option<usize>) {
        self.quota = quota;
    }

    fn quota(&self) -> usize {
        self.quota.unwrap_or(self.trainers.len())
    }

    /// Whether the quota has been issued in full
    pub fn exhausted(&self) -> bool {
        self.issued >= self.quota()
    }
}

impl PipelineSearcher for DefaultsOnlySearch {
    fn set_search_space(&mut self, transforms: Vec<TransformSpec>, trainers: Vec<TrainerConfig>) {
        self.transforms = transforms;
        self.trainers = trainers;
        self.issued = 0;
    }

    fn get_next_candidates(&mut self, _history: &RunHistory, batch_size: usize) -> Vec<Candidate> {
        let mut out = Vec::new();
        if self.trainers.is_empty() {
            return out;
        }
        while self.issued < self.quota() && out.len() < batch_size {
            let template = &self.trainers[self.issued % self.trainers.len()];
            out.push(Candidate::build(&self.transforms, template));
            self.issued += 1;
        }
        out
    }

    fn update_active_trainers(&mut self, _history: &RunHistory, _k: usize) {}
}

enum Proposal {
    Fresh(Candidate),
    /// Novelty retries exhausted; the last construction is carried so the
    /// search can still make progress
    Exhausted(Candidate),
    Unavailable,
}

/// The staged search engine
///
/// A three-stage state machine: stage First delegates to an owned
/// [`DefaultsOnlySearch`]; stages Second and Third round-robin the active
/// trainers and sweep their hyperparameters, with per-slot novelty retries
/// against the dedup guard.
pub struct StagedSearch {
    config: StagedSearchConfig,
    direction: OptimizeDirection,
    stage: SearchStage,
    defaults: DefaultsOnlySearch,
    transforms: Vec<TransformSpec>,
    trainers: Vec<TrainerConfig>,
    active: Vec<TrainerConfig>,
    sweepers: HashMap<String, Box<dyn Sweeper>>,
    cursor: usize,
    remaining_in_stage: usize,
    second_initialized: bool,
    guard: DedupGuard,
    rng: Xoshiro256PlusPlus,
}

impl StagedSearch {
    /// Create an engine for the session's optimize direction; call
    /// `set_search_space` before requesting candidates
    pub fn new(direction: OptimizeDirection, config: StagedSearchConfig) -> Self {
        let rng = match config.seed {
            Some(s) => Xoshiro256PlusPlus::seed_from_u64(s),
            None => Xoshiro256PlusPlus::from_entropy(),
        };
        Self {
            config,
            direction,
            stage: SearchStage::First,
            defaults: DefaultsOnlySearch::new(),
            transforms: Vec::new(),
            trainers: Vec::new(),
            active: Vec::new(),
            sweepers: HashMap::new(),
            cursor: 0,
            remaining_in_stage: 0,
            second_initialized: false,
            guard: DedupGuard::new(),
            rng,
        }
    }

    /// Current stage
    pub fn stage(&self) -> SearchStage {
        self.stage
    }

    /// Names of the currently active trainers
    pub fn active_trainers(&self) -> Vec<&str> {
        self.active.iter().map(|t| t.name.as_str()).collect()
    }

    /// Record an evaluation outcome for dedup purposes
    ///
    /// Proposed candidates are already marked visited; a crashed evaluation
    /// additionally enters the failed set so the key is never retried.
    pub fn record_result(&mut self, candidate: &Candidate, failed: bool) {
        self.guard.mark_visited(candidate.identity_key());
        if failed {
            self.guard.mark_failed(candidate.identity_key());
        }
    }

    fn fill(&mut self, history: &RunHistory, want: usize, out: &mut Vec<Candidate>) {
        if want == 0 || self.trainers.is_empty() {
            return;
        }
        match self.stage {
            SearchStage::First => {
                let batch = self.defaults.get_next_candidates(history, want);
                for c in &batch {
                    self.guard.mark_visited(c.identity_key());
                }
                let taken = batch.len();
                out.extend(batch);
                if self.defaults.exhausted() {
                    self.stage = SearchStage::Second;
                    self.second_initialized = false;
                    self.fill(history, want - taken, out);
                }
            }
            SearchStage::Second => {
                if !self.second_initialized {
                    self.enter_second_stage(history);
                }
                let mut produced = 0;
                while produced < want
                    && self.remaining_in_stage > 0
                    && self.stage == SearchStage::Second
                {
                    match self.next_swept_candidate(history) {
                        Proposal::Fresh(c) => {
                            self.guard.mark_visited(c.identity_key());
                            out.push(c);
                            produced += 1;
                            self.remaining_in_stage -= 1;
                        }
                        Proposal::Exhausted(c) => {
                            // Parameter space looks exhausted for this
                            // trainer; take the candidate and move on to the
                            // refinement stage.
                            self.guard.mark_visited(c.identity_key());
                            out.push(c);
                            produced += 1;
                            self.remaining_in_stage -= 1;
                            self.stage = SearchStage::Third;
                            debug!("second stage exhausted novelty, advancing to third");
                        }
                        Proposal::Unavailable => {
                            self.stage = SearchStage::Third;
                        }
                    }
                }
                if self.remaining_in_stage == 0 {
                    self.stage = SearchStage::Third;
                }
                if self.stage == SearchStage::Third && produced < want {
                    self.fill(history, want - produced, out);
                }
            }
            SearchStage::Third => {
                let mut produced = 0;
                while produced < want {
                    match self.next_swept_candidate(history) {
                        Proposal::Fresh(c) | Proposal::Exhausted(c) => {
                            self.guard.mark_visited(c.identity_key());
                            out.push(c);
                            produced += 1;
                        }
                        Proposal::Unavailable => break,
                    }
                }
            }
        }
    }

    /// Select the top-K trainers by best observed score and seed a fresh
    /// sweeper for each
    fn enter_second_stage(&mut self, history: &RunHistory) {
        let k = self.config.top_k.min(self.trainers.len()).max(1);

        let mut ranked = history.best_score_per_trainer();
        ranked.sort_by(|a, b| match self.direction {
            OptimizeDirection::Maximize => b.1.total_cmp(&a.1),
            OptimizeDirection::Minimize => a.1.total_cmp(&b.1),
        });

        let mut selected: Vec<TrainerConfig> = ranked
            .iter()
            .filter_map(|(name, _)| self.trainers.iter().find(|t| &t.name == name).cloned())
            .take(k)
            .collect();
        if selected.is_empty() {
            selected = self.trainers.iter().take(k).cloned().collect();
        }

        debug!(
            active = ?selected.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            "entering second stage"
        );

        self.install_active(selected);
        self.remaining_in_stage = self.active.len() * self.config.trials_per_trainer;
        self.second_initialized = true;
    }

    fn install_active(&mut self, selected: Vec<TrainerConfig>) {
        self.sweepers = selected
            .iter()
            .map(|t| {
                let seed = Some(self.rng.gen::<u64>());
                (
                    t.name.clone(),
                    create_sweeper(&t.params, self.direction, seed),
                )
            })
            .collect();
        self.active = selected;
        self.cursor = 0;
    }

    /// Round-robin one slot: sweep the next active trainer's parameters and
    /// build a candidate, retrying construction against the dedup guard
    fn next_swept_candidate(&mut self, history: &RunHistory) -> Proposal {
        if self.active.is_empty() {
            return Proposal::Unavailable;
        }
        let idx = self.cursor % self.active.len();
        self.cursor += 1;
        let template = self.active[idx].clone();
        let observations = history.trainer_observations(&template.name);

        let Some(sweeper) = self.sweepers.get_mut(&template.name) else {
            return Proposal::Unavailable;
        };

        let mut last = None;
        for _ in 0..self.config.max_candidate_attempts.max(1) {
            let Some(params) = sweeper.propose_sweeps(1, &observations).pop() else {
                break;
            };
            let config = template.clone().with_assignment(params);
            let candidate = Candidate::build(&self.transforms, &config);
            if self.guard.is_novel(candidate.identity_key()) {
                return Proposal::Fresh(candidate);
            }
            last = Some(candidate);
        }
        match last {
            Some(c) => Proposal::Exhausted(c),
            None => Proposal::Unavailable,
        }
    }
}

impl PipelineSearcher for StagedSearch {
    fn set_search_space(&mut self, transforms: Vec<TransformSpec>, trainers: Vec<TrainerConfig>) {
        self.defaults
            .set_search_space(transforms.clone(), trainers.clone());
        self.defaults.set_quota(self.config.first_stage_trials);
        self.transforms = transforms;
        self.trainers = trainers;
        self.stage = SearchStage::First;
        self.active.clear();
        self.sweepers.clear();
        self.cursor = 0;
        self.remaining_in_stage = 0;
        self.second_initialized = false;
        self.guard = DedupGuard::new();
    }

    fn get_next_candidates(&mut self, history: &RunHistory, batch_size: usize) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(batch_size);
        self.fill(history, batch_size, &mut out);
        out
    }

    fn update_active_trainers(&mut self, history: &RunHistory, k: usize) {
        if self.active.is_empty() {
            let fallback: Vec<TrainerConfig> =
                self.trainers.iter().take(k.max(1)).cloned().collect();
            self.install_active(fallback);
            return;
        }
        let weights = compute_weights(&self.active, history);
        let draws = sample_trainers(&weights, k.max(1), &mut self.rng);
        let selected: Vec<TrainerConfig> =
            draws.into_iter().map(|i| self.active[i].clone()).collect();
        self.install_active(selected);
    }
}
