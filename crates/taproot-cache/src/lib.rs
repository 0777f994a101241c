//! Persistent caches for the dependency map: a JSON key/value store for
//! serialized graph records and a size/mtime/hash change-detection cache.

pub mod change_cache;
pub mod error;
pub mod map_cache;

pub use change_cache::{ChangeCache, FileStamp};
pub use error::{CacheError, Result};
pub use map_cache::MapCache;

use std::fs;
use std::path::Path;

/// Write `bytes` to `path` through a sibling temp file and a rename, so a
/// crash mid-write never leaves a truncated cache behind.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| CacheError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, bytes).map_err(|source| CacheError::Io {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Remove the cache file if it exists. Missing files are not an error.
pub(crate) fn remove_cache_file(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
