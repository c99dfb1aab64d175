//! Candidate deduplication and failure tracking

use std::collections::HashSet;

/// Tracks identity keys of previously attempted and previously failed
/// candidates
///
/// Owned by a single search engine instance and discarded with it; there is
/// no process-wide state.
#[derive(Debug, Default)]
pub struct DedupGuard {
    visited: HashSet<String>,
    failed: HashSet<String>,
}

impl DedupGuard {
    /// Create an empty guard
    pub fn new() -> Self {
        Self::default()
    }

    /// A candidate is valid only if its key is in neither set
    pub fn is_novel(&self, key: &str) -> bool {
        !self.visited.contains(key) && !self.failed.contains(key)
    }

    /// Record that a candidate was proposed or evaluated
    pub fn mark_visited(&mut self, key: &str) {
        self.visited.insert(key.to_string());
    }

    /// Record that evaluating a candidate crashed; the key is never retried,
    /// even across stage resets
    pub fn mark_failed(&mut self, key: &str) {
        self.visited.insert(key.to_string());
        self.failed.insert(key.to_string());
    }

    /// Number of visited keys
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Number of failed keys
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}
