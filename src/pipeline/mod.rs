//! Pipeline building blocks
//!
//! Provides the immutable [`Candidate`] pairing of a transform set and a
//! trainer configuration, the task-kind/metric dispatch, and the traits
//! through which external collaborators supply transforms and trainers and
//! evaluate materialized pipelines.

mod candidate;
mod task;
mod trainer;
mod transform;
mod traits;

pub use candidate::Candidate;
pub use task::{Metric, OptimizeDirection, TaskKind};
pub use trainer::TrainerConfig;
pub use transform::{bitmask_of, TransformSpec, NORMALIZER_GROUP_ID};
pub use traits::{Evaluation, Evaluator, TrainerCatalog, TransformInference};
