//! Metrics describing the evolution of a training run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::model::{Pair, TokenId};

/// Reason a training run terminated. Every variant is a normal outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// The configured iteration budget was used up.
    MaxIterationsReached,
    /// No adjacent pair occurs at least twice in the corpus.
    NoRepeatedPairs,
    /// The next token identifier would exceed the configured maximum.
    TokenLimitReached,
}

/// Metrics captured for each learned merge rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IterationMetrics {
    /// Sequential iteration number (1-indexed).
    pub iteration: usize,
    /// Pair selected by the iteration.
    pub pair: Pair,
    /// Token issued for the pair.
    pub token: TokenId,
    /// Corpus-wide count of the pair before the merge.
    pub frequency: usize,
    /// Replacements actually performed (occurrences can overlap, replacements cannot).
    pub merges_applied: usize,
    /// Execution time for the iteration.
    pub elapsed_iteration: Duration,
    /// Total time elapsed since training started.
    pub elapsed_total: Duration,
}

/// Aggregate metrics produced by a training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrainingMetrics {
    /// Per-iteration snapshots accrued during training.
    pub iterations: Vec<IterationMetrics>,
    /// Total duration of the training session.
    pub total_duration: Duration,
    /// Reason training terminated.
    pub stop_reason: StopReason,
}

impl TrainingMetrics {
    /// Creates an empty metrics container with pre-allocated capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            iterations: Vec::with_capacity(capacity),
            total_duration: Duration::ZERO,
            stop_reason: StopReason::MaxIterationsReached,
        }
    }

    /// Number of merge rules learned by the run.
    #[must_use]
    pub fn merges(&self) -> usize {
        self.iterations.len()
    }
}
