//! Search termination criteria

use std::time::{Duration, Instant};

/// Decides when the search loop must stop
///
/// Two independently composable criteria: a maximum history length and a
/// wall-clock budget measured from construction. Either firing stops the
/// loop.
#[derive(Debug, Clone)]
pub struct Terminator {
    max_iterations: Option<usize>,
    time_budget: Option<Duration>,
    started: Instant,
}

impl Terminator {
    /// Create a terminator; the wall clock starts now
    pub fn new(max_iterations: Option<usize>, time_budget: Option<Duration>) -> Self {
        Self {
            max_iterations,
            time_budget,
            started: Instant::now(),
        }
    }

    /// Whether the search must stop given the current history length
    pub fn should_terminate(&self, history_len: usize) -> bool {
        if let Some(max) = self.max_iterations {
            if history_len >= max {
                return true;
            }
        }
        if let Some(budget) = self.time_budget {
            if self.started.elapsed() >= budget {
                return true;
            }
        }
        false
    }

    /// Iterations left in the budget, floored at zero
    ///
    /// Used by the engine to avoid requesting an oversized batch near the
    /// end of the budget.
    pub fn remaining_iterations(&self, history_len: usize) -> usize {
        match self.max_iterations {
            Some(max) => max.saturating_sub(history_len),
            None => usize::MAX,
        }
    }

    /// Elapsed wall-clock time since the session started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_criterion() {
        let term = Terminator::new(Some(10), None);
        for len in 0..10 {
            assert!(!term.should_terminate(len), "should run at length {len}");
        }
        assert!(term.should_terminate(10));
        assert!(term.should_terminate(11));
    }

    #[test]
    fn test_remaining_iterations_floored() {
        let term = Terminator::new(Some(10), None);
        assert_eq!(term.remaining_iterations(0), 10);
        assert_eq!(term.remaining_iterations(7), 3);
        assert_eq!(term.remaining_iterations(10), 0);
        assert_eq!(term.remaining_iterations(15), 0);
    }

    #[test]
    fn test_time_criterion() {
        let term = Terminator::new(None, Some(Duration::ZERO));
        assert!(term.should_terminate(0));

        let term = Terminator::new(None, Some(Duration::from_secs(3600)));
        assert!(!term.should_terminate(0));
    }

    #[test]
    fn test_unbounded() {
        let term = Terminator::new(None, None);
        assert!(!term.should_terminate(1_000_000));
        assert_eq!(term.remaining_iterations(1_000_000), usize::MAX);
    }
}
