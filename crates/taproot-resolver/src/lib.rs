//! Reference dependency extractor for taproot
//!
//! Implements the core's extraction boundary for JavaScript/TypeScript
//! sources: scan import specifiers, resolve the relative ones to absolute
//! paths, skip package imports. Other languages plug in by implementing
//! `taproot_core::DependencyExtractor` themselves.

pub mod ignore;
pub mod javascript;

pub use ignore::IgnoreRules;
pub use javascript::JsModuleResolver;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern")]
    Pattern(#[from] globset::Error),
}
