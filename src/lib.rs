//! Byte pair encoding (BPE) tokenizer library and CLI.
//!
//! The crate learns an ordered table of merge rules from a chunked text corpus and
//! uses it to map arbitrary byte sequences to token ids and back. Ids 0-255 stand
//! for single bytes; the i-th learned rule issues id `256 + i`. Training text is
//! optionally normalized with a regex find-and-replace and cut into chunks with a
//! second regex; pairs never span two chunks.
//!
//! ```no_run
//! use bytepair::{Tokenizer, TokenizerConfig};
//!
//! # fn main() -> bytepair::Result<()> {
//! let config = TokenizerConfig::builder().default_normalizer().build()?;
//! let mut tokenizer = Tokenizer::new(config)?;
//! tokenizer.load_text(b"the cat sat on the mat");
//! tokenizer.fit(1000, 1000);
//! tokenizer.save("params.json", true)?;
//!
//! let tokens = tokenizer.encode(b"the mat");
//! assert_eq!(tokenizer.decode(&tokens)?, b"the mat");
//! # Ok(())
//! # }
//! ```
//!
//! The CLI is enabled by default through the `cli` feature. Users targeting the
//! library portion only can disable default features to avoid the CLI
//! dependencies: `bytepair = { version = "...", default-features = false }`.

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    clippy::all,
    rust_2018_idioms,
    future_incompatible,
    unused_lifetimes,
    unreachable_pub
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::doc_markdown,
    clippy::multiple_crate_versions
)]

pub mod codec;
pub mod config;
pub mod corpus;
pub mod error;
pub mod metrics;
pub mod model;
pub mod preprocess;
pub mod serialization;
pub mod tokenizer;
pub mod trainer;
pub mod vocab;

pub use config::{
    FitBuilder, FitConfig, IngestConfig, NormalizerConfig, TokenizerBuilder, TokenizerConfig,
};
pub use error::{BpeError, Result};
pub use metrics::{IterationMetrics, StopReason, TrainingMetrics};
pub use model::{MergeTable, Pair, TokenId};
pub use preprocess::{Chunker, Normalizer};
pub use serialization::VocabularyArtifact;
pub use tokenizer::Tokenizer;
pub use trainer::{Corpus, Trainer};
