//! JSON vocabulary artifact: merge rules plus the text preparation settings used to
//! train them.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{NormalizerConfig, TokenizerConfig};
use crate::error::{BpeError, Result};
use crate::model::{MergeTable, Pair, TokenId};

/// Persisted form of a trained tokenizer.
///
/// ```json
/// {
///   "preprocessor": {"pattern": "([;.]|^)(\\p{L})", "replacement": "$1 $2"},
///   "split_regexp": "\\p{L}+|\\s+",
///   "last_token": 257,
///   "replacement_keys": [[97, 97], [256, 256]],
///   "replacement_values": [256, 257]
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VocabularyArtifact {
    /// Normalizer applied before chunking; `null` when text was used verbatim.
    #[serde(rename = "preprocessor", default)]
    pub normalizer: Option<NormalizerConfig>,
    /// Chunking pattern used to cut training text.
    #[serde(rename = "split_regexp")]
    pub split_pattern: String,
    /// Highest token identifier issued.
    pub last_token: TokenId,
    /// Pair replaced by each rule, in creation order.
    #[serde(rename = "replacement_keys")]
    pub rule_keys: Vec<Pair>,
    /// Token issued by each rule, index-aligned with `rule_keys`.
    #[serde(rename = "replacement_values")]
    pub rule_values: Vec<TokenId>,
}

impl VocabularyArtifact {
    /// Captures a configuration and merge table.
    #[must_use]
    pub fn new(config: &TokenizerConfig, table: &MergeTable) -> Self {
        Self {
            normalizer: config.normalizer.clone(),
            split_pattern: config.split_pattern.clone(),
            last_token: table.last_token(),
            rule_keys: table.keys().to_vec(),
            rule_values: table.values().to_vec(),
        }
    }

    /// Serialises the artifact to JSON.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    /// Parses JSON bytes. Syntax and shape errors are reported as
    /// [`BpeError::MalformedArtifact`]; consistency is checked by
    /// [`VocabularyArtifact::into_parts`].
    pub fn from_json(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(|err| BpeError::MalformedArtifact(err.to_string()))
    }

    /// Validates the artifact and splits it into a configuration and merge table.
    pub fn into_parts(self) -> Result<(TokenizerConfig, MergeTable)> {
        let table = MergeTable::from_parts(self.rule_keys, self.rule_values, self.last_token)?;
        let config = TokenizerConfig {
            split_pattern: self.split_pattern,
            normalizer: self.normalizer,
        };
        config.validate().map_err(|err| match err {
            BpeError::InvalidPattern(msg) => BpeError::MalformedArtifact(msg),
            other => other,
        })?;
        Ok((config, table))
    }
}

/// Writes an artifact to `path` as JSON.
pub fn save_artifact<P: AsRef<Path>>(
    path: P,
    artifact: &VocabularyArtifact,
    pretty: bool,
) -> Result<()> {
    let json = artifact.to_json(pretty)?;
    fs::write(path.as_ref(), json)
        .map_err(|err| BpeError::io(err, Some(path.as_ref().to_path_buf())))
}

/// Reads and parses an artifact from `path`.
pub fn load_artifact<P: AsRef<Path>>(path: P) -> Result<VocabularyArtifact> {
    let data =
        fs::read(path.as_ref()).map_err(|err| BpeError::io(err, Some(path.as_ref().to_path_buf())))?;
    VocabularyArtifact::from_json(&data)
}
