//! Helpers for persisting trained vocabularies.

pub mod artifact;

pub use artifact::{load_artifact, save_artifact, VocabularyArtifact};
