//! Dependency extraction boundary consumed by the populator

use std::path::{Path, PathBuf};

/// Extractor failures are opaque to the core; they are carried as the
/// source of [`crate::Error::Extractor`] with the offending path attached.
pub type ExtractorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Resolves a single source file to the absolute paths of its direct
/// imports.
///
/// Implementations must be pure with respect to disk contents at call time,
/// may return an empty list, and must not return external-package paths
/// (the core filters those defensively as well). Language-specific
/// extractors plug in behind this trait without touching the graph.
pub trait DependencyExtractor {
    fn extract(&self, file: &Path, cwd: &Path) -> Result<Vec<PathBuf>, ExtractorError>;
}
