//! pipesearch - Staged pipeline search for supervised AutoML
//!
//! This crate selects a complete data-processing-plus-model-training
//! configuration for a supervised learning task: it searches a space of
//! feature-transform sets, trainers and their hyperparameters, runs
//! successive trial evaluations, and converges on a high-scoring pipeline
//! inside a bounded iteration/time budget.
//!
//! The crate is the decision core only. Inferring transforms from raw data,
//! executing a pipeline against data, and computing metrics are external
//! collaborators reached through the traits in [`pipeline`].
//!
//! # Modules
//!
//! - [`params`] - Hyperparameter domains, values and value generators
//! - [`sweep`] - Sweeping strategies proposing new assignments from history
//! - [`pipeline`] - Candidates, trainers, transforms, task/metric dispatch
//! - [`search`] - The staged engine, run history, weighting, termination
//!
//! # Example
//!
//! ```
//! use pipesearch::prelude::*;
//!
//! let transforms = vec![TransformSpec::new("impute", 0)];
//! let trainers = vec![
//!     TrainerConfig::new("gbt", vec![ParamSpec::log_float("lr", 1e-3, 1.0)]),
//!     TrainerConfig::new("knn", vec![]),
//! ];
//!
//! let config = SessionConfig::new(TaskKind::BinaryClassification)
//!     .with_max_iterations(10)
//!     .with_seed(42);
//! let evaluator = |candidate: &Candidate| Evaluation::Success {
//!     score: if candidate.trainer().name == "gbt" { 0.9 } else { 0.6 },
//! };
//!
//! let mut session = SearchSession::new(config, transforms, trainers, evaluator).unwrap();
//! let report = session.run().unwrap();
//! assert_eq!(report.best().unwrap().candidate.trainer().name, "gbt");
//! ```

// Core error handling
pub mod error;

// Hyperparameter domains and sweeping
pub mod params;
pub mod sweep;

// Pipeline building blocks and collaborator interfaces
pub mod pipeline;

// Staged search engine
pub mod search;

pub use error::{Result, SearchError};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{Result, SearchError};

    // Hyperparameters
    pub use crate::params::{ParamDomain, ParamSpec, ParamValue, ParameterSet, ValueGenerator};

    // Sweeping
    pub use crate::sweep::{
        create_sweeper, NoOpSweeper, PopulationSweeper, RandomSweeper, SweepObservation, Sweeper,
    };

    // Pipeline
    pub use crate::pipeline::{
        bitmask_of, Candidate, Evaluation, Evaluator, Metric, OptimizeDirection, TaskKind,
        TrainerCatalog, TrainerConfig, TransformInference, TransformSpec,
    };

    // Search
    pub use crate::search::{
        compute_weights, sample_trainers, DedupGuard, DefaultsOnlySearch, PipelineSearcher,
        RunHistory, RunResult, SearchReport, SearchSession, SearchStage, SessionConfig,
        StagedSearch, StagedSearchConfig, Terminator,
    };
}
