//! Core error types

use std::path::PathBuf;
use thiserror::Error;

use crate::extractor::ExtractorError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The one-shot initialize step was entered twice.
    #[error("dependency map is already initialized")]
    AlreadyInitialized,

    /// The dependency extractor failed for a specific file.
    #[error("dependency extraction failed for {path}")]
    Extractor {
        path: PathBuf,
        #[source]
        source: ExtractorError,
    },

    /// Cache persistence or load failed.
    #[error(transparent)]
    CacheIo(#[from] taproot_cache::CacheError),

    /// A provided path cannot be made absolute against the working directory.
    #[error("cannot resolve {path} to an absolute path")]
    InvalidPath { path: PathBuf },
}
