//! Facilities for discovering training files and reading them into memory.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::config::IngestConfig;
use crate::error::{BpeError, Result};

/// Discovers files rooted at the provided input paths according to the ingest configuration.
///
/// Directories are traversed recursively by default; set [`IngestConfig::recursive`] to `false`
/// to limit discovery to the first level. Files inside a directory are returned in file name
/// order so that training on the same tree is reproducible.
pub fn collect_paths<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let path = input.as_ref();
        if !path.exists() {
            return Err(BpeError::InvalidConfig(format!(
                "input path {path:?} does not exist"
            )));
        }
        let metadata = path
            .symlink_metadata()
            .map_err(|err| BpeError::io(err, Some(path.to_path_buf())))?;
        if metadata.is_dir() {
            let max_depth = if cfg.recursive { usize::MAX } else { 1 };
            let walker = WalkDir::new(path)
                .follow_links(cfg.follow_symlinks)
                .max_depth(max_depth)
                .sort_by_file_name();
            for entry in walker {
                let entry = entry.map_err(|err| {
                    let entry_path = err.path().map(Path::to_path_buf);
                    match err.into_io_error() {
                        Some(io) => BpeError::io(io, entry_path),
                        None => BpeError::InvalidConfig("filesystem loop detected".into()),
                    }
                })?;
                if entry.file_type().is_file() {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            files.push(path.to_path_buf());
        }
    }
    if files.is_empty() {
        return Err(BpeError::InvalidConfig(
            "no files discovered in provided inputs".into(),
        ));
    }
    Ok(files)
}

/// Reads every discovered file into memory, one buffer per file, in discovery order.
///
/// Empty files are skipped; an input set yielding no bytes at all is an error.
pub fn load_text_corpus<P: AsRef<Path>>(inputs: &[P], cfg: &IngestConfig) -> Result<Vec<Vec<u8>>> {
    let file_paths = collect_paths(inputs, cfg)?;
    let mut texts = Vec::with_capacity(file_paths.len());
    for file_path in file_paths {
        let buffer =
            fs::read(&file_path).map_err(|err| BpeError::io(err, Some(file_path.clone())))?;
        debug!("read {} bytes from {}", buffer.len(), file_path.display());
        if !buffer.is_empty() {
            texts.push(buffer);
        }
    }
    if texts.is_empty() {
        return Err(BpeError::InvalidConfig(
            "no text could be loaded from inputs".into(),
        ));
    }
    Ok(texts)
}
