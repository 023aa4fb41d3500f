//! Training loop that learns merge rules from a chunked corpus.

use std::time::Instant;

use log::{log, Level};

use crate::config::FitConfig;
use crate::metrics::{IterationMetrics, StopReason, TrainingMetrics};
use crate::model::{merge_pair, MergeTable, Pair, TokenId};

mod pairs;

/// Token sequences of every chunk loaded for training.
///
/// Each chunk starts as one base token per byte and is rewritten in place as rules
/// are learned. Pairs are only ever counted and replaced inside a chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    chunks: Vec<Vec<TokenId>>,
}

impl Corpus {
    /// Creates an empty corpus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps already tokenized chunks.
    #[must_use]
    pub fn from_chunks(chunks: Vec<Vec<TokenId>>) -> Self {
        Self { chunks }
    }

    /// Appends one chunk of raw bytes. Empty chunks are ignored.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.chunks
            .push(bytes.iter().map(|&b| TokenId::from(b)).collect());
    }

    /// Current token sequences, in load order.
    #[must_use]
    pub fn chunks(&self) -> &[Vec<TokenId>] {
        &self.chunks
    }

    /// Number of chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Returns `true` when nothing has been loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of tokens across all chunks.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    /// Most frequent pair with its count, or `None` when no pair occurs twice.
    ///
    /// Ties go to the pair whose count reaches the maximum first while scanning
    /// chunks in order, left to right.
    #[must_use]
    pub fn most_frequent_pair(&self) -> Option<(Pair, usize)> {
        pairs::most_frequent_pair(&self.chunks)
    }

    /// Replaces `pair` with `token` in every chunk and returns the replacement count.
    pub fn replace_pair(&mut self, pair: Pair, token: TokenId) -> usize {
        self.chunks
            .iter_mut()
            .map(|chunk| merge_pair(chunk, pair, token))
            .sum()
    }
}

/// Runs the greedy merge loop with a fixed [`FitConfig`].
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    cfg: FitConfig,
}

impl Trainer {
    /// Creates a new trainer for the supplied configuration.
    #[must_use]
    pub fn new(cfg: FitConfig) -> Self {
        Self { cfg }
    }

    /// Learns up to `max_iterations` rules, appending them to `table` and rewriting
    /// `corpus` after each one.
    ///
    /// Training stops early, without error, when no pair occurs at least twice or
    /// when the next token would exceed `max_token_value`.
    pub fn fit(&self, corpus: &mut Corpus, table: &mut MergeTable) -> TrainingMetrics {
        let level = if self.cfg.show_progress {
            Level::Info
        } else {
            Level::Debug
        };
        let training_start = Instant::now();
        let mut metrics = TrainingMetrics::new(self.cfg.max_iterations.min(4096));

        for iteration in 1..=self.cfg.max_iterations {
            let iteration_start = Instant::now();
            let Some((pair, frequency)) = corpus.most_frequent_pair() else {
                metrics.stop_reason = StopReason::NoRepeatedPairs;
                break;
            };
            let token = match table.next_token() {
                Some(token) if token <= self.cfg.max_token_value => token,
                _ => {
                    metrics.stop_reason = StopReason::TokenLimitReached;
                    break;
                }
            };

            table.push(pair, token);
            let merges_applied = corpus.replace_pair(pair, token);

            log!(
                level,
                "iter {:>6} pair ({:>5}, {:>5}) -> {:>6} freq {:>8} merges {:>8}",
                iteration,
                pair.0,
                pair.1,
                token,
                frequency,
                merges_applied
            );

            metrics.iterations.push(IterationMetrics {
                iteration,
                pair,
                token,
                frequency,
                merges_applied,
                elapsed_iteration: iteration_start.elapsed(),
                elapsed_total: training_start.elapsed(),
            });
        }

        metrics.total_duration = training_start.elapsed();
        log!(
            level,
            "learned {} merges in {:.2?} ({:?}); last token {}",
            metrics.merges(),
            metrics.total_duration,
            metrics.stop_reason,
            table.last_token()
        );
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trainer(max_iterations: usize, max_token_value: TokenId) -> Trainer {
        Trainer::new(
            FitConfig::builder()
                .max_iterations(max_iterations)
                .max_token_value(max_token_value)
                .build(),
        )
    }

    #[test]
    fn replace_pair_stays_inside_chunks() {
        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        assert_eq!(corpus.replace_pair((2, 3), 256), 1);
        assert_eq!(corpus.chunks(), &[vec![1, 256], vec![4, 5, 6]]);
    }

    #[test]
    fn most_frequent_pair_is_merged_everywhere() {
        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 3, 2, 3], vec![2, 3, 4]]);
        assert_eq!(corpus.most_frequent_pair(), Some(((2, 3), 3)));
        let mut table = MergeTable::new();
        let metrics = trainer(1, 1000).fit(&mut corpus, &mut table);
        assert_eq!(metrics.merges(), 1);
        assert_eq!(table.keys(), &[(2, 3)]);
        assert_eq!(table.values(), &[256]);
        assert_eq!(corpus.chunks(), &[vec![1, 256, 256], vec![256, 4]]);
    }

    #[test]
    fn unique_pairs_learn_nothing() {
        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 3], vec![5, 6, 7]]);
        assert_eq!(corpus.most_frequent_pair(), None);
        let mut table = MergeTable::new();
        let metrics = trainer(10, 1000).fit(&mut corpus, &mut table);
        assert!(table.is_empty());
        assert_eq!(metrics.stop_reason, StopReason::NoRepeatedPairs);
    }

    #[test]
    fn repeated_runs_collapse_to_single_token() {
        let mut corpus = Corpus::new();
        corpus.push_bytes(b"aaaa");
        corpus.push_bytes(b"aaaa");
        let mut table = MergeTable::new();
        let metrics = trainer(10, 1000).fit(&mut corpus, &mut table);
        assert_eq!(table.keys(), &[(97, 97), (256, 256)]);
        assert_eq!(table.last_token(), 257);
        assert_eq!(corpus.chunks(), &[vec![257], vec![257]]);
        assert_eq!(metrics.stop_reason, StopReason::NoRepeatedPairs);
    }

    #[test]
    fn lone_run_stops_when_pair_occurs_once() {
        let mut corpus = Corpus::new();
        corpus.push_bytes(b"aaaa");
        let mut table = MergeTable::new();
        trainer(10, 1000).fit(&mut corpus, &mut table);
        assert_eq!(table.keys(), &[(97, 97)]);
        assert_eq!(corpus.chunks(), &[vec![256, 256]]);
    }

    #[test]
    fn token_limit_stops_without_issuing() {
        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 3, 1, 2, 3, 1, 2, 3]]);
        let mut table = MergeTable::new();
        let metrics = trainer(10, 256).fit(&mut corpus, &mut table);
        assert_eq!(table.keys(), &[(1, 2)]);
        assert_eq!(table.last_token(), 256);
        assert_eq!(metrics.stop_reason, StopReason::TokenLimitReached);

        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 1, 2]]);
        let mut table = MergeTable::new();
        let metrics = trainer(10, 100).fit(&mut corpus, &mut table);
        assert!(table.is_empty());
        assert_eq!(table.last_token(), 255);
        assert_eq!(metrics.stop_reason, StopReason::TokenLimitReached);
    }

    #[test]
    fn iteration_budget_bounds_rule_count() {
        let text = b"the cat sat on the mat with the hat and the bat";
        let mut corpus = Corpus::new();
        corpus.push_bytes(text);
        let mut table = MergeTable::new();
        let metrics = trainer(3, 1000).fit(&mut corpus, &mut table);
        assert_eq!(table.len(), 3);
        assert_eq!(metrics.stop_reason, StopReason::MaxIterationsReached);
        assert_eq!(table.values(), &[256, 257, 258]);

        let mut table = MergeTable::new();
        let metrics = trainer(0, 1000).fit(&mut corpus, &mut table);
        assert!(table.is_empty());
        assert_eq!(metrics.stop_reason, StopReason::MaxIterationsReached);
    }

    #[test]
    fn resumed_training_continues_numbering() {
        let mut corpus = Corpus::from_chunks(vec![vec![1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]]);
        let mut table = MergeTable::new();
        trainer(1, 1000).fit(&mut corpus, &mut table);
        trainer(1, 1000).fit(&mut corpus, &mut table);
        assert_eq!(table.values(), &[256, 257]);
        for (idx, &value) in table.values().iter().enumerate() {
            assert_eq!(value as usize, 256 + idx);
        }
    }

    #[test]
    fn metrics_record_each_iteration() {
        let mut corpus = Corpus::from_chunks(vec![vec![7, 8, 7, 8, 7, 8]]);
        let mut table = MergeTable::new();
        let metrics = trainer(5, 1000).fit(&mut corpus, &mut table);
        let first = &metrics.iterations[0];
        assert_eq!(first.iteration, 1);
        assert_eq!(first.pair, (7, 8));
        assert_eq!(first.token, 256);
        assert_eq!(first.frequency, 3);
        assert_eq!(first.merges_applied, 3);
    }
}
