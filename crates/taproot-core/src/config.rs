//! Construction options for the dependency map

use std::path::PathBuf;

pub const MODULE_MAP_CACHE_FILENAME: &str = "module-map.cache.json";
pub const FILE_ENTRY_CACHE_FILENAME: &str = "file-entry.cache.json";

/// Options accepted by [`crate::DependencyMap::new`].
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Base filename for the serialized graph, inside `cache_dir`.
    pub module_map_cache_filename: String,
    /// Base filename for the change-detection snapshot, inside `cache_dir`.
    pub file_entry_cache_filename: String,
    /// Directory holding both cache files, owned exclusively by one map
    /// instance for its lifetime.
    pub cache_dir: PathBuf,
    /// Destroy both caches before loading (cold start).
    pub reset: bool,
    /// Initial entry files, absolute or relative to `cwd`.
    pub entry_files: Vec<PathBuf>,
    /// Glob patterns excluded from dependency discovery; consulted by the
    /// extractor boundary.
    pub ignored: Vec<String>,
    /// Anchor for resolving any non-absolute input path.
    pub cwd: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            module_map_cache_filename: MODULE_MAP_CACHE_FILENAME.to_string(),
            file_entry_cache_filename: FILE_ENTRY_CACHE_FILENAME.to_string(),
            cache_dir: PathBuf::from(".taproot"),
            reset: false,
            entry_files: Vec::new(),
            ignored: Vec::new(),
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}
