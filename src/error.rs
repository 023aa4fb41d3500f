//! Error handling utilities shared across the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::TokenId;

/// Convenient result type used throughout the crate.
pub type Result<T, E = BpeError> = std::result::Result<T, E>;

/// Domain-specific error describing failures while loading vocabularies, decoding
/// tokens, or reading corpora.
#[derive(Debug, Error)]
pub enum BpeError {
    /// A persisted vocabulary is structurally invalid or internally inconsistent.
    #[error("malformed vocabulary artifact: {0}")]
    MalformedArtifact(String),
    /// Decode received a token the merge table never issued.
    #[error("malformed token {token}: highest issued token is {last_token}")]
    MalformedToken {
        /// Offending token identifier.
        token: TokenId,
        /// Highest token identifier known to the merge table.
        last_token: TokenId,
    },
    /// A normalization or chunking pattern failed to compile.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
    /// Ingest or tokenizer configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A textual token list could not be parsed.
    #[error("invalid token list: {0}")]
    InvalidTokenList(String),
    /// Filesystem IO error with optional context path.
    #[error("io error while processing {path:?}: {source}")]
    Io {
        /// Underlying IO error returned by the standard library.
        source: std::io::Error,
        /// Target path associated with the IO failure if available.
        path: Option<PathBuf>,
    },
    /// Serialization failure while producing an artifact.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for BpeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for BpeError {
    fn from(err: regex::Error) -> Self {
        Self::InvalidPattern(err.to_string())
    }
}

impl BpeError {
    /// Helper constructor that attaches an optional path when wrapping IO errors.
    pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
        Self::Io { source, path }
    }
}
