//! High-level tokenizer combining text preparation, training, and the codec.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use rayon::prelude::*;

use crate::codec;
use crate::config::{FitConfig, TokenizerConfig};
use crate::error::Result;
use crate::metrics::TrainingMetrics;
use crate::model::{MergeTable, TokenId};
use crate::preprocess::{Chunker, Normalizer};
use crate::serialization::{load_artifact, save_artifact, VocabularyArtifact};
use crate::trainer::{Corpus, Trainer};
use crate::vocab;

/// Byte pair encoding tokenizer.
///
/// A tokenizer owns its text preparation settings, the training corpus loaded so
/// far, and the merge table learned from it. Encoding and decoding only read the
/// merge table, so a trained tokenizer can be shared across threads.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    config: TokenizerConfig,
    chunker: Chunker,
    normalizer: Option<Normalizer>,
    corpus: Corpus,
    table: MergeTable,
}

impl Tokenizer {
    /// Creates an untrained tokenizer, compiling the configured patterns.
    pub fn new(config: TokenizerConfig) -> Result<Self> {
        let (chunker, normalizer) = config.compile()?;
        Ok(Self {
            config,
            chunker,
            normalizer,
            corpus: Corpus::new(),
            table: MergeTable::new(),
        })
    }

    /// Creates an untrained tokenizer with [`TokenizerConfig::default`].
    pub fn with_defaults() -> Result<Self> {
        Self::new(TokenizerConfig::default())
    }

    /// Text preparation settings.
    #[must_use]
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Learned merge rules.
    pub fn merge_table(&self) -> &MergeTable {
        &self.table
    }

    /// Training chunks in their current, partially merged state.
    #[must_use]
    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Applies the configured normalizer, or returns `text` unchanged when there is none.
    #[must_use]
    pub fn normalize<'t>(&self, text: &'t [u8]) -> Cow<'t, [u8]> {
        match &self.normalizer {
            Some(normalizer) => normalizer.apply(text),
            None => Cow::Borrowed(text),
        }
    }

    /// Normalizes and chunks `text`, appending the chunks to the training corpus.
    /// Returns the number of chunks added.
    pub fn load_text(&mut self, text: &[u8]) -> usize {
        let normalized = self.normalize(text);
        let chunks = self.chunker.split(&normalized);
        let added = chunks.len();
        for chunk in chunks {
            self.corpus.push_bytes(chunk);
        }
        debug!(
            "loaded {} bytes as {} chunks ({} chunks total)",
            text.len(),
            added,
            self.corpus.len()
        );
        added
    }

    /// Appends chunks produced by an external chunker, bypassing normalization.
    pub fn load_chunks<I, C>(&mut self, chunks: I)
    where
        I: IntoIterator<Item = C>,
        C: AsRef<[u8]>,
    {
        for chunk in chunks {
            self.corpus.push_bytes(chunk.as_ref());
        }
    }

    /// Learns at most `max_iterations` rules without issuing tokens above
    /// `max_token_value`.
    pub fn fit(&mut self, max_iterations: usize, max_token_value: TokenId) -> TrainingMetrics {
        let cfg = FitConfig::builder()
            .max_iterations(max_iterations)
            .max_token_value(max_token_value)
            .build();
        self.fit_with(&cfg)
    }

    /// Runs training with a full [`FitConfig`].
    pub fn fit_with(&mut self, cfg: &FitConfig) -> TrainingMetrics {
        Trainer::new(cfg.clone()).fit(&mut self.corpus, &mut self.table)
    }

    /// Encodes raw bytes. No normalization is applied.
    #[must_use]
    pub fn encode(&self, data: &[u8]) -> Vec<TokenId> {
        codec::encode(&self.table, data)
    }

    /// Normalizes `text` and then encodes it.
    #[must_use]
    pub fn encode_text(&self, text: &[u8]) -> Vec<TokenId> {
        self.encode(&self.normalize(text))
    }

    /// Encodes independent inputs in parallel, preserving input order.
    #[must_use]
    pub fn encode_batch<T>(&self, inputs: &[T]) -> Vec<Vec<TokenId>>
    where
        T: AsRef<[u8]> + Sync,
    {
        inputs
            .par_iter()
            .map(|input| self.encode(input.as_ref()))
            .collect()
    }

    /// Decodes tokens back into bytes.
    pub fn decode(&self, tokens: &[TokenId]) -> Result<Vec<u8>> {
        codec::decode(&self.table, tokens)
    }

    /// Encodes raw bytes into whitespace separated token identifiers.
    #[must_use]
    pub fn encode_to_string(&self, data: &[u8]) -> String {
        codec::format_tokens(&self.encode(data))
    }

    /// Decodes whitespace separated token identifiers.
    pub fn decode_from_string(&self, text: &str) -> Result<Vec<u8>> {
        self.decode(&codec::parse_tokens(text)?)
    }

    /// Bytes represented by every merge token, keyed by token identifier.
    #[must_use]
    pub fn string_tokens(&self) -> BTreeMap<TokenId, Vec<u8>> {
        vocab::resolve_tokens(&self.table)
    }

    /// Snapshot of the persisted state.
    #[must_use]
    pub fn to_artifact(&self) -> VocabularyArtifact {
        VocabularyArtifact::new(&self.config, &self.table)
    }

    /// Rebuilds a tokenizer from a validated artifact. The corpus starts empty.
    pub fn from_artifact(artifact: VocabularyArtifact) -> Result<Self> {
        let (config, table) = artifact.into_parts()?;
        let mut tokenizer = Self::new(config)?;
        tokenizer.table = table;
        Ok(tokenizer)
    }

    /// Serialises the artifact as compact JSON.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        Ok(self.to_artifact().to_json(false)?.into_bytes())
    }

    /// Restores a tokenizer from JSON produced by [`Tokenizer::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        Self::from_artifact(VocabularyArtifact::from_json(data)?)
    }

    /// Writes the artifact to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P, pretty: bool) -> Result<()> {
        save_artifact(path, &self.to_artifact(), pretty)
    }

    /// Loads a tokenizer from an artifact file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_artifact(load_artifact(path)?)
    }
}
