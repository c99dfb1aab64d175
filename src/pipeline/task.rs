//! Task kinds and evaluation metric dispatch

use serde::{Deserialize, Serialize};

/// Direction of optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptimizeDirection {
    Minimize,
    Maximize,
}

/// Supervised learning task kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    BinaryClassification,
    MulticlassClassification,
    Regression,
}

impl TaskKind {
    /// Default evaluation metric for this task kind
    ///
    /// One distinct metric per kind: AUC for binary classification,
    /// micro-averaged accuracy for multiclass, R-squared for regression.
    pub fn default_metric(&self) -> Metric {
        match self {
            TaskKind::BinaryClassification => Metric::Auc,
            TaskKind::MulticlassClassification => Metric::AccuracyMicro,
            TaskKind::Regression => Metric::RSquared,
        }
    }
}

/// Evaluation metrics understood by the search engine
///
/// The engine never computes a metric itself; it only needs to know which
/// direction makes a score better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    Auc,
    AccuracyMicro,
    AccuracyMacro,
    LogLoss,
    RSquared,
    Rmse,
}

impl Metric {
    /// Whether larger scores are better for this metric
    pub fn direction(&self) -> OptimizeDirection {
        match self {
            Metric::Auc
            | Metric::AccuracyMicro
            | Metric::AccuracyMacro
            | Metric::RSquared => OptimizeDirection::Maximize,
            Metric::LogLoss | Metric::Rmse => OptimizeDirection::Minimize,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_distinct_metric_per_task() {
        let metrics = [
            TaskKind::BinaryClassification.default_metric(),
            TaskKind::MulticlassClassification.default_metric(),
            TaskKind::Regression.default_metric(),
        ];
        assert_eq!(metrics[0], Metric::Auc);
        assert_eq!(metrics[1], Metric::AccuracyMicro);
        assert_eq!(metrics[2], Metric::RSquared);
        assert_ne!(metrics[0], metrics[1]);
        assert_ne!(metrics[1], metrics[2]);
    }

    #[test]
    fn test_metric_directions() {
        assert_eq!(Metric::Auc.direction(), OptimizeDirection::Maximize);
        assert_eq!(Metric::Rmse.direction(), OptimizeDirection::Minimize);
        assert_eq!(Metric::LogLoss.direction(), OptimizeDirection::Minimize);
    }
}
