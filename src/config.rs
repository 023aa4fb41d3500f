//! Configuration builders controlling text preparation, training, and corpus ingestion.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::TokenId;
use crate::preprocess::{
    Chunker, Normalizer, DEFAULT_NORMALIZER_PATTERN, DEFAULT_NORMALIZER_REPLACEMENT,
    DEFAULT_SPLIT_PATTERN,
};

/// Pattern and replacement describing a [`Normalizer`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Regular expression searched for in raw text.
    pub pattern: String,
    /// Replacement template; groups are referenced as `$1` or `$name`.
    pub replacement: String,
}

impl NormalizerConfig {
    /// Creates a normalizer description.
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Compiles the described [`Normalizer`].
    pub fn compile(&self) -> Result<Normalizer> {
        Normalizer::new(&self.pattern, self.replacement.clone())
    }
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_NORMALIZER_PATTERN, DEFAULT_NORMALIZER_REPLACEMENT)
    }
}

/// Text preparation settings a tokenizer is created with and persists alongside its
/// merge table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Chunking pattern; every match becomes one training chunk.
    pub split_pattern: String,
    /// Optional find-and-replace applied before chunking. `None` leaves text untouched.
    pub normalizer: Option<NormalizerConfig>,
}

impl TokenizerConfig {
    /// Returns a builder initialised with [`TokenizerConfig::default`].
    #[must_use]
    pub fn builder() -> TokenizerBuilder {
        TokenizerBuilder::default()
    }

    /// Compiles both patterns, reporting the first that fails.
    pub fn compile(&self) -> Result<(Chunker, Option<Normalizer>)> {
        let chunker = Chunker::new(&self.split_pattern)?;
        let normalizer = self
            .normalizer
            .as_ref()
            .map(NormalizerConfig::compile)
            .transpose()?;
        Ok((chunker, normalizer))
    }

    /// Validates that the configured patterns compile.
    pub fn validate(&self) -> Result<()> {
        self.compile().map(|_| ())
    }
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            split_pattern: DEFAULT_SPLIT_PATTERN.into(),
            normalizer: None,
        }
    }
}

/// Builder for [`TokenizerConfig`].
#[derive(Debug, Default, Clone)]
pub struct TokenizerBuilder {
    cfg: TokenizerConfig,
}

impl TokenizerBuilder {
    /// Creates a builder with [`TokenizerConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the chunking pattern.
    #[must_use]
    pub fn split_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.cfg.split_pattern = pattern.into();
        self
    }

    /// Installs a normalizer.
    #[must_use]
    pub fn normalizer(mut self, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        self.cfg.normalizer = Some(NormalizerConfig::new(pattern, replacement));
        self
    }

    /// Installs the default sentence-start normalizer.
    #[must_use]
    pub fn default_normalizer(mut self) -> Self {
        self.cfg.normalizer = Some(NormalizerConfig::default());
        self
    }

    /// Removes any normalizer.
    #[must_use]
    pub fn without_normalizer(mut self) -> Self {
        self.cfg.normalizer = None;
        self
    }

    /// Finalises the builder, returning a validated [`TokenizerConfig`].
    pub fn build(self) -> Result<TokenizerConfig> {
        self.cfg.validate()?;
        Ok(self.cfg)
    }
}

/// Limits and reporting options for a training run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FitConfig {
    /// Maximum number of merge rules learned by one run.
    pub max_iterations: usize,
    /// Largest token identifier a merge rule may issue.
    pub max_token_value: TokenId,
    /// Logs every iteration at `info` level instead of `debug`.
    pub show_progress: bool,
}

impl FitConfig {
    /// Returns a builder initialised with [`FitConfig::default`].
    #[must_use]
    pub fn builder() -> FitBuilder {
        FitBuilder::default()
    }
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_token_value: 1000,
            show_progress: false,
        }
    }
}

/// Builder for [`FitConfig`].
#[derive(Debug, Default, Clone)]
pub struct FitBuilder {
    cfg: FitConfig,
}

impl FitBuilder {
    /// Creates a builder with [`FitConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the iteration budget.
    #[must_use]
    pub fn max_iterations(mut self, value: usize) -> Self {
        self.cfg.max_iterations = value;
        self
    }

    /// Sets the largest token identifier training may issue.
    #[must_use]
    pub fn max_token_value(mut self, value: TokenId) -> Self {
        self.cfg.max_token_value = value;
        self
    }

    /// Enables or disables per-iteration logging at `info` level.
    #[must_use]
    pub fn show_progress(mut self, enabled: bool) -> Self {
        self.cfg.show_progress = enabled;
        self
    }

    /// Finalises the builder. Every combination of limits is valid; limits that
    /// leave no room for merges simply stop training immediately.
    #[must_use]
    pub fn build(self) -> FitConfig {
        self.cfg
    }
}

/// Configuration controlling how text corpora are discovered on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestConfig {
    /// Enables recursive directory traversal.
    pub recursive: bool,
    /// Follows symlinks encountered during traversal.
    pub follow_symlinks: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            follow_symlinks: false,
        }
    }
}

impl IngestConfig {
    /// Returns a builder initialised with [`IngestConfig::default`].
    #[must_use]
    pub fn builder() -> IngestBuilder {
        IngestBuilder::default()
    }
}

/// Builder for [`IngestConfig`].
#[derive(Debug, Default, Clone)]
pub struct IngestBuilder {
    cfg: IngestConfig,
}

impl IngestBuilder {
    /// Creates a new builder with [`IngestConfig::default`] settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables recursive directory traversal.
    #[must_use]
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.cfg.recursive = enabled;
        self
    }

    /// Enables or disables following of symlinks when traversing directories.
    #[must_use]
    pub fn follow_symlinks(mut self, enabled: bool) -> Self {
        self.cfg.follow_symlinks = enabled;
        self
    }

    /// Finalises the builder, returning the [`IngestConfig`].
    #[must_use]
    pub fn build(self) -> IngestConfig {
        self.cfg
    }
}
