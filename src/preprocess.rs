//! Regex driven transformations that turn raw text into training chunks.
//!
//! The [`Normalizer`] performs one find-and-replace pass over the input. The
//! [`Chunker`] then cuts the normalized bytes into chunks; merges never cross a
//! chunk boundary.

use std::borrow::Cow;

use regex::bytes::Regex;

use crate::error::Result;

/// Chunking pattern used when none is configured.
///
/// The final branch matches runs of bytes that are not valid UTF-8, which no Unicode
/// class accepts; without it such bytes would fall between chunks.
pub const DEFAULT_SPLIT_PATTERN: &str = r"'(?i:[sdmt]|ll|ve|re)|[^\r\n\p{L}\p{N}]?\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]+[\r\n]*|\s*[\r\n]|\s+|(?-u:[\x80-\xFF])+";
/// Normalizer pattern used by the CLI defaults: a letter at the start of the text or
/// after `;`/`.`.
pub const DEFAULT_NORMALIZER_PATTERN: &str = r"([;.]|^)(\p{L})";
/// Replacement paired with [`DEFAULT_NORMALIZER_PATTERN`]; inserts a space before the letter.
pub const DEFAULT_NORMALIZER_REPLACEMENT: &str = "$1 $2";

/// Find-and-replace transformation applied before chunking.
#[derive(Debug, Clone)]
pub struct Normalizer {
    regex: Regex,
    replacement: String,
}

impl Normalizer {
    /// Compiles `pattern`; `replacement` may reference groups as `$1` or `$name`.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            replacement: replacement.into(),
        })
    }

    /// Source of the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Replacement template.
    #[must_use]
    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replaces every match in `text`, borrowing the input when nothing matched.
    #[must_use]
    pub fn apply<'t>(&self, text: &'t [u8]) -> Cow<'t, [u8]> {
        self.regex.replace_all(text, self.replacement.as_bytes())
    }
}

impl PartialEq for Normalizer {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern() && self.replacement == other.replacement
    }
}

impl Eq for Normalizer {}

/// Splits text into the chunks the trainer counts pairs within.
#[derive(Debug, Clone)]
pub struct Chunker {
    regex: Regex,
}

impl Chunker {
    /// Compiles the chunking pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    /// Source of the compiled pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns the non-empty, non-overlapping matches of the pattern in order.
    ///
    /// Bytes not covered by any match are dropped from the training corpus.
    #[must_use]
    pub fn split<'t>(&self, text: &'t [u8]) -> Vec<&'t [u8]> {
        self.regex
            .find_iter(text)
            .map(|m| m.as_bytes())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }
}

impl PartialEq for Chunker {
    fn eq(&self, other: &Self) -> bool {
        self.pattern() == other.pattern()
    }
}

impl Eq for Chunker {}
