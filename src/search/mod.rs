//! Staged pipeline search
//!
//! The engine side of the crate: deduplication, trainer weighting,
//! termination, run history, and the staged search state machine that ties
//! them together, plus the session runner driving the evaluate loop.

mod dedup;
mod engine;
mod history;
mod session;
mod terminator;
mod weighting;

pub use dedup::DedupGuard;
pub use engine::{
    DefaultsOnlySearch, PipelineSearcher, SearchStage, StagedSearch, StagedSearchConfig,
    MAX_CANDIDATE_ATTEMPTS, SECOND_STAGE_TRIALS_PER_TRAINER, TOP_K,
};
pub use history::{RunHistory, RunResult};
pub use session::{SearchReport, SearchSession, SessionConfig};
pub use terminator::Terminator;
pub use weighting::{compute_weights, sample_trainers};
