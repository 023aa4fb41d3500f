//! The learned vocabulary: an ordered merge table plus the replacement primitive
//! shared by training and encoding.

use crate::error::{BpeError, Result};

/// Token identifier used throughout the crate.
pub type TokenId = u32;
/// Merge pair encoded as `(left, right)` token identifiers.
pub type Pair = (TokenId, TokenId);

/// Highest base token; tokens `0..=255` stand for the byte of the same value.
pub const MAX_BASE_TOKEN: TokenId = 255;
/// Identifier issued by the first merge rule.
pub const FIRST_MERGE_TOKEN: TokenId = MAX_BASE_TOKEN + 1;

/// Ordered merge rules learned during training.
///
/// Rules are kept as two index-aligned sequences: `keys[i]` is the pair replaced by
/// rule `i` and `values[i]` is the token it issues, always `256 + i`. The order is
/// the order rules were learned in, which is also the order encode applies them.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeTable {
    keys: Vec<Pair>,
    values: Vec<TokenId>,
    last_token: TokenId,
}

impl Default for MergeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MergeTable {
    /// Creates an empty table; only the base tokens are known.
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            values: Vec::new(),
            last_token: MAX_BASE_TOKEN,
        }
    }

    /// Rebuilds a table from persisted parts, rejecting inconsistent input.
    ///
    /// The checks enforce the invariants every trained table satisfies: aligned
    /// sequences, values issued contiguously from 256, keys referencing only base
    /// tokens or tokens of earlier rules, and a `last_token` matching the rule count.
    pub fn from_parts(keys: Vec<Pair>, values: Vec<TokenId>, last_token: TokenId) -> Result<Self> {
        if keys.len() != values.len() {
            return Err(BpeError::MalformedArtifact(format!(
                "{} rule keys but {} rule values",
                keys.len(),
                values.len()
            )));
        }
        for (idx, (&(left, right), &value)) in keys.iter().zip(values.iter()).enumerate() {
            let expected = FIRST_MERGE_TOKEN as usize + idx;
            if value as usize != expected {
                return Err(BpeError::MalformedArtifact(format!(
                    "rule {idx} issues token {value}, expected {expected}"
                )));
            }
            for component in [left, right] {
                if component > MAX_BASE_TOKEN && component >= value {
                    return Err(BpeError::MalformedArtifact(format!(
                        "rule {idx} references token {component} which no earlier rule issued"
                    )));
                }
            }
        }
        let expected_last = MAX_BASE_TOKEN as usize + keys.len();
        if last_token as usize != expected_last {
            return Err(BpeError::MalformedArtifact(format!(
                "last_token is {last_token} but {} rules imply {expected_last}",
                keys.len()
            )));
        }
        Ok(Self {
            keys,
            values,
            last_token,
        })
    }

    /// Pairs replaced by each rule, in creation order.
    #[must_use]
    pub fn keys(&self) -> &[Pair] {
        &self.keys
    }

    /// Tokens issued by each rule, index-aligned with [`MergeTable::keys`].
    #[must_use]
    pub fn values(&self) -> &[TokenId] {
        &self.values
    }

    /// Highest token identifier issued so far (255 for an empty table).
    #[must_use]
    pub fn last_token(&self) -> TokenId {
        self.last_token
    }

    /// Number of merge rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` when no rule has been learned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates `(pair, token)` rules in creation order.
    pub fn rules(&self) -> impl DoubleEndedIterator<Item = (Pair, TokenId)> + ExactSizeIterator + '_ {
        self.keys.iter().copied().zip(self.values.iter().copied())
    }

    /// Identifier the next rule would receive, `None` once the id space is exhausted.
    #[must_use]
    pub fn next_token(&self) -> Option<TokenId> {
        self.last_token.checked_add(1)
    }

    /// Appends a rule issuing `token`, which must be [`MergeTable::next_token`].
    pub(crate) fn push(&mut self, pair: Pair, token: TokenId) {
        debug_assert_eq!(Some(token), self.next_token());
        self.keys.push(pair);
        self.values.push(token);
        self.last_token = token;
    }
}

/// Replaces every non-overlapping occurrence of `pair` in `sequence` with
/// `replacement`, scanning left to right, and returns the number of replacements.
///
/// A match at `i` consumes `i` and `i + 1`; scanning resumes at `i + 2`. Training and
/// encoding both go through this function so the two always agree.
pub fn merge_pair(sequence: &mut Vec<TokenId>, pair: Pair, replacement: TokenId) -> usize {
    let original_len = sequence.len();
    if original_len < 2 {
        return 0;
    }

    let mut read = 0usize;
    let mut write = 0usize;
    let mut merges = 0usize;
    while read < original_len {
        if read + 1 < original_len && sequence[read] == pair.0 && sequence[read + 1] == pair.1 {
            sequence[write] = replacement;
            read += 2;
            merges += 1;
        } else {
            sequence[write] = sequence[read];
            read += 1;
        }
        write += 1;
    }

    sequence.truncate(write);
    merges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_rule_table() -> MergeTable {
        MergeTable::from_parts(vec![(97, 98), (256, 99)], vec![256, 257], 257)
            .expect("valid table")
    }

    #[test]
    fn merge_pair_skips_overlapping_matches() {
        let mut seq = vec![97, 97, 97];
        assert_eq!(merge_pair(&mut seq, (97, 97), 256), 1);
        assert_eq!(seq, vec![256, 97]);
    }

    #[test]
    fn merge_pair_replaces_every_occurrence() {
        let mut seq = vec![1, 2, 3, 2, 3];
        assert_eq!(merge_pair(&mut seq, (2, 3), 256), 2);
        assert_eq!(seq, vec![1, 256, 256]);
    }

    #[test]
    fn merge_pair_leaves_short_sequences_alone() {
        let mut seq = vec![7];
        assert_eq!(merge_pair(&mut seq, (7, 7), 256), 0);
        assert_eq!(seq, vec![7]);
    }

    #[test]
    fn rules_iterate_in_creation_order() {
        let table = two_rule_table();
        let rules: Vec<_> = table.rules().collect();
        assert_eq!(rules, vec![((97, 98), 256), ((256, 99), 257)]);
        assert_eq!(table.rules().rev().next(), Some(((256, 99), 257)));
        assert_eq!(table.next_token(), Some(258));
    }

    #[test]
    fn from_parts_rejects_length_mismatch() {
        let err = MergeTable::from_parts(vec![(1, 2)], vec![], 256).expect_err("mismatch");
        assert!(matches!(err, BpeError::MalformedArtifact(msg) if msg.contains("rule values")));
    }

    #[test]
    fn from_parts_rejects_forward_reference() {
        let err = MergeTable::from_parts(vec![(1, 257), (1, 2)], vec![256, 257], 257)
            .expect_err("forward reference");
        assert!(matches!(err, BpeError::MalformedArtifact(msg) if msg.contains("no earlier rule")));
    }

    #[test]
    fn from_parts_rejects_self_reference_and_gaps() {
        assert!(MergeTable::from_parts(vec![(256, 1)], vec![256], 256).is_err());
        assert!(MergeTable::from_parts(vec![(1, 2)], vec![300], 256).is_err());
    }

    #[test]
    fn from_parts_rejects_inconsistent_last_token() {
        let err = MergeTable::from_parts(vec![(1, 2)], vec![256], 300).expect_err("bad last");
        assert!(matches!(err, BpeError::MalformedArtifact(msg) if msg.contains("last_token")));
    }

    #[test]
    fn from_parts_rejects_last_token_bumped_past_final_rule() {
        // a table whose counter ran one ahead of its rules after hitting the ceiling
        let err = MergeTable::from_parts(vec![(1, 2)], vec![256], 257).expect_err("one past");
        assert!(matches!(err, BpeError::MalformedArtifact(msg) if msg.contains("1 rules imply 256")));
    }

    #[test]
    fn empty_table_starts_at_base_alphabet() {
        let table = MergeTable::new();
        assert!(table.is_empty());
        assert_eq!(table.last_token(), MAX_BASE_TOKEN);
        assert_eq!(table.next_token(), Some(FIRST_MERGE_TOKEN));
    }
}
