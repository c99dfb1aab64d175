//! Search session runner

use super::engine::{PipelineSearcher, StagedSearch, StagedSearchConfig};
use super::history::{RunHistory, RunResult};
use super::terminator::Terminator;
use crate::error::{Result, SearchError};
use crate::pipeline::{
    Evaluation, Evaluator, Metric, OptimizeDirection, TaskKind, TrainerCatalog, TrainerConfig,
    TransformInference, TransformSpec, NORMALIZER_GROUP_ID,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Configuration of a search session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Supervised task kind
    pub task: TaskKind,
    /// Evaluation metric; defaults to the task's distinct metric
    pub metric: Option<Metric>,
    /// Maximum number of trials
    pub max_iterations: usize,
    /// Candidates proposed per engine call
    pub batch_size: usize,
    /// Wall-clock budget in seconds
    pub time_budget_secs: Option<f64>,
    /// Engine tunables
    pub search: StagedSearchConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            task: TaskKind::BinaryClassification,
            metric: None,
            max_iterations: 100,
            batch_size: 1,
            time_budget_secs: None,
            search: StagedSearchConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Create a configuration for a task kind
    pub fn new(task: TaskKind) -> Self {
        Self {
            task,
            ..Default::default()
        }
    }

    /// Builder method to set the trial budget
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Builder method to set the proposal batch size
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    /// Builder method to set the wall-clock budget
    pub fn with_time_budget(mut self, secs: f64) -> Self {
        self.time_budget_secs = Some(secs);
        self
    }

    /// Builder method to override the metric
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = Some(metric);
        self
    }

    /// Builder method to set the engine seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.search.seed = Some(seed);
        self
    }
}

/// Full outcome of a search session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    /// All trial results in insertion order
    pub results: Vec<RunResult>,
    /// Index of the best successful result, ties broken by earliest
    /// insertion
    pub best_index: Option<usize>,
    /// Metric the session optimized
    pub metric: Metric,
    /// Direction derived from the metric
    pub direction: OptimizeDirection,
    /// Total session duration
    pub total_duration_secs: f64,
}

impl SearchReport {
    /// The best result, if any trial succeeded
    pub fn best(&self) -> Option<&RunResult> {
        self.best_index.map(|i| &self.results[i])
    }

    /// Save the report as JSON
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a report from JSON
    pub fn load(path: &str) -> Result<SearchReport> {
        let json = std::fs::read_to_string(path)?;
        let report: SearchReport = serde_json::from_str(&json)?;
        Ok(report)
    }
}

/// Drives the propose/evaluate loop for one search session
///
/// Single-threaded and synchronous: the engine proposes a batch, each
/// candidate is evaluated in sequence, and every result is appended to
/// history before the next batch is proposed. The session is cancellable
/// between candidates via the time budget.
pub struct SearchSession<E: Evaluator> {
    config: SessionConfig,
    searcher: StagedSearch,
    history: RunHistory,
    evaluator: E,
    metric: Metric,
}

impl<E: Evaluator> SearchSession<E> {
    /// Create a session over an explicit search space
    ///
    /// Fails with a configuration error before any trial runs when no
    /// trainers are supplied.
    pub fn new(
        config: SessionConfig,
        transforms: Vec<TransformSpec>,
        trainers: Vec<TrainerConfig>,
        evaluator: E,
    ) -> Result<Self> {
        if trainers.is_empty() {
            return Err(SearchError::Config(format!(
                "no trainers registered for task {:?}",
                config.task
            )));
        }
        for trainer in &trainers {
            for spec in &trainer.params {
                spec.validate()?;
            }
        }
        for transform in &transforms {
            if transform.group_id >= 64 {
                return Err(SearchError::Config(format!(
                    "transform {} has group id {} outside the 64-bit identity mask",
                    transform.name, transform.group_id
                )));
            }
            if transform.group_id == NORMALIZER_GROUP_ID
                && *transform != TransformSpec::normalizer()
            {
                return Err(SearchError::Config(format!(
                    "transform {} uses the group id reserved for normalization",
                    transform.name
                )));
            }
        }
        let metric = config.metric.unwrap_or_else(|| config.task.default_metric());
        let direction = metric.direction();

        let mut searcher = StagedSearch::new(direction, config.search.clone());
        searcher.set_search_space(transforms, trainers);

        Ok(Self {
            config,
            searcher,
            history: RunHistory::new(direction),
            evaluator,
            metric,
        })
    }

    /// Create a session, pulling the search space from the collaborators
    pub fn from_collaborators(
        config: SessionConfig,
        inference: &impl TransformInference,
        catalog: &impl TrainerCatalog,
        evaluator: E,
    ) -> Result<Self> {
        let transforms = inference.available_transforms();
        let trainers = catalog.available_trainers(config.task, config.max_iterations);
        Self::new(config, transforms, trainers, evaluator)
    }

    /// Accumulated history
    pub fn history(&self) -> &RunHistory {
        &self.history
    }

    /// Run the search to completion and return the full report
    pub fn run(&mut self) -> Result<SearchReport> {
        let started = Instant::now();
        let terminator = Terminator::new(
            Some(self.config.max_iterations),
            self.config.time_budget_secs.map(Duration::from_secs_f64),
        );

        'search: loop {
            if terminator.should_terminate(self.history.len()) {
                break;
            }
            let want = self
                .config
                .batch_size
                .min(terminator.remaining_iterations(self.history.len()));

            let batch = self.searcher.get_next_candidates(&self.history, want);
            if batch.is_empty() {
                warn!(
                    trials = self.history.len(),
                    "no further candidates available, stopping early"
                );
                break;
            }

            for candidate in batch {
                if terminator.should_terminate(self.history.len()) {
                    break 'search;
                }
                let trial_start = Instant::now();
                let seq = self.history.len();

                match self.evaluator.evaluate(&candidate) {
                    Evaluation::Success { score } => {
                        self.searcher.record_result(&candidate, false);
                        info!(
                            trial = seq,
                            score,
                            elapsed_secs = trial_start.elapsed().as_secs_f64(),
                            pipeline = %candidate.describe(),
                            "trial complete"
                        );
                        self.history.append(RunResult {
                            candidate,
                            score,
                            succeeded: true,
                        });
                    }
                    Evaluation::Failure { reason } => {
                        self.searcher.record_result(&candidate, true);
                        error!(
                            trial = seq,
                            reason = %reason,
                            pipeline = %candidate.describe(),
                            "trial failed"
                        );
                        // Sentinel score keeps the result out of the ranked
                        // view and out of weighting
                        let score = match self.history.direction() {
                            OptimizeDirection::Maximize => f64::NEG_INFINITY,
                            OptimizeDirection::Minimize => f64::INFINITY,
                        };
                        self.history.append(RunResult {
                            candidate,
                            score,
                            succeeded: false,
                        });
                    }
                }
            }
        }

        Ok(SearchReport {
            results: self.history.results().to_vec(),
            best_index: self.history.best_index(),
            metric: self.metric,
            direction: self.history.direction(),
            total_duration_secs: started.elapsed().as_secs_f64(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamSpec;
    use crate::pipeline::Candidate;

    fn transforms() -> Vec<TransformSpec> {
        vec![
            TransformSpec::new("impute", 0),
            TransformSpec::new("onehot", 1),
        ]
    }

    fn trainers() -> Vec<TrainerConfig> {
        vec![
            TrainerConfig::new("gbt", vec![ParamSpec::log_float("lr", 1e-3, 1.0)]),
            TrainerConfig::new("forest", vec![ParamSpec::long("trees", 10, 200)]),
            TrainerConfig::new("knn", vec![]),
        ]
    }

    fn scoring_evaluator() -> impl FnMut(&Candidate) -> Evaluation {
        |candidate: &Candidate| {
            let base = match candidate.trainer().name.as_str() {
                "gbt" => 0.8,
                "forest" => 0.7,
                _ => 0.5,
            };
            Evaluation::Success { score: base }
        }
    }

    #[test]
    fn test_session_requires_trainers() {
        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let result = SearchSession::new(config, transforms(), vec![], scoring_evaluator());
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_invalid_param_domain_is_fatal() {
        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let bad = vec![TrainerConfig::new(
            "svm",
            vec![ParamSpec::discrete("kernel", vec![])],
        )];
        let result = SearchSession::new(config, transforms(), bad, scoring_evaluator());
        assert!(matches!(result, Err(SearchError::InvalidParameter { .. })));

        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let bad = vec![TrainerConfig::new(
            "gbt",
            vec![ParamSpec::log_float("lr", 0.0, 1.0)],
        )];
        let result = SearchSession::new(config, transforms(), bad, scoring_evaluator());
        assert!(matches!(result, Err(SearchError::InvalidParameter { .. })));
    }

    #[test]
    fn test_out_of_range_transform_group_is_fatal() {
        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let bad = vec![TransformSpec::new("impute", 64)];
        let result = SearchSession::new(config, bad, trainers(), scoring_evaluator());
        assert!(matches!(result, Err(SearchError::Config(_))));

        // Group 63 is reserved for the auto-appended normalizer
        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let reserved = vec![TransformSpec::new("scale", 63)];
        let result = SearchSession::new(config, reserved, trainers(), scoring_evaluator());
        assert!(matches!(result, Err(SearchError::Config(_))));

        // The normalizer itself may be supplied explicitly
        let config = SessionConfig::new(TaskKind::BinaryClassification);
        let explicit = vec![TransformSpec::new("impute", 0), TransformSpec::normalizer()];
        assert!(SearchSession::new(config, explicit, trainers(), scoring_evaluator()).is_ok());
    }

    #[test]
    fn test_session_runs_to_iteration_budget() {
        let config = SessionConfig::new(TaskKind::BinaryClassification)
            .with_max_iterations(8)
            .with_batch_size(3)
            .with_seed(42);
        let mut session =
            SearchSession::new(config, transforms(), trainers(), scoring_evaluator()).unwrap();

        let report = session.run().unwrap();
        assert_eq!(report.results.len(), 8);
        let best = report.best().unwrap();
        assert_eq!(best.candidate.trainer().name, "gbt");
        assert_eq!(report.metric, Metric::Auc);
    }

    #[test]
    fn test_failures_do_not_abort_session() {
        let config = SessionConfig::new(TaskKind::BinaryClassification)
            .with_max_iterations(6)
            .with_batch_size(2)
            .with_seed(7);
        let evaluator = |candidate: &Candidate| {
            if candidate.trainer().name == "forest" {
                Evaluation::Failure {
                    reason: "training diverged".to_string(),
                }
            } else {
                Evaluation::Success { score: 0.6 }
            }
        };
        let mut session = SearchSession::new(config, transforms(), trainers(), evaluator).unwrap();

        let report = session.run().unwrap();
        assert_eq!(report.results.len(), 6);
        assert!(report.results.iter().any(|r| !r.succeeded));
        // Best never points at a failed run
        assert!(report.best().unwrap().succeeded);
    }

    #[test]
    fn test_report_roundtrip() {
        let config = SessionConfig::new(TaskKind::Regression)
            .with_max_iterations(4)
            .with_seed(42);
        let mut session =
            SearchSession::new(config, transforms(), trainers(), scoring_evaluator()).unwrap();
        let report = session.run().unwrap();

        let dir = std::env::temp_dir().join("pipesearch_report_test.json");
        let path = dir.to_str().unwrap();
        report.save(path).unwrap();
        let loaded = SearchReport::load(path).unwrap();
        std::fs::remove_file(path).ok();

        assert_eq!(loaded.results.len(), report.results.len());
        assert_eq!(loaded.best_index, report.best_index);
    }
}
