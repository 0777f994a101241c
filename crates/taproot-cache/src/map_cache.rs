//! JSON key/value store for serialized graph records

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

const MAP_CACHE_VERSION: u32 = 1;

#[derive(Deserialize)]
struct Snapshot<V> {
    version: u32,
    #[allow(dead_code)]
    cached_at: String,
    entries: BTreeMap<String, V>,
}

#[derive(Serialize)]
struct SnapshotRef<'a, V> {
    version: u32,
    cached_at: String,
    entries: &'a BTreeMap<String, V>,
}

/// A persistent mapping from absolute filename to a serializable record.
///
/// The on-disk form is a single versioned JSON document. A missing,
/// unreadable, or stale-versioned file is treated as an empty cache (cold
/// start), never as an error.
#[derive(Debug)]
pub struct MapCache<V> {
    path: PathBuf,
    entries: BTreeMap<String, V>,
}

impl<V: Serialize + DeserializeOwned> MapCache<V> {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        MapCache { path, entries }
    }

    /// All records currently held, keyed by filename.
    pub fn all(&self) -> &BTreeMap<String, V> {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key)
    }

    pub fn set_key(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), value);
    }

    pub fn remove_key(&mut self, key: &str) -> Option<V> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Persist the current entries to disk.
    pub fn save(&self) -> Result<()> {
        let snapshot = SnapshotRef {
            version: MAP_CACHE_VERSION,
            cached_at: chrono::Utc::now().to_rfc3339(),
            entries: &self.entries,
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(|source| {
            CacheError::Serialize {
                path: self.path.clone(),
                source,
            }
        })?;
        crate::write_atomic(&self.path, &bytes)?;
        debug!("map cache saved: {}", self.path.display());
        Ok(())
    }

    /// Drop all entries and delete the backing file.
    pub fn destroy(&mut self) -> Result<()> {
        self.entries.clear();
        crate::remove_cache_file(&self.path)
    }
}

fn load_entries<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => {
            debug!("no map cache at {}, cold start", path.display());
            return BTreeMap::new();
        }
    };
    let snapshot: Snapshot<V> = match serde_json::from_str(&data) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("unreadable map cache at {}: {}, cold start", path.display(), e);
            return BTreeMap::new();
        }
    };
    if snapshot.version != MAP_CACHE_VERSION {
        warn!(
            "map cache version {} at {} does not match {}, cold start",
            snapshot.version,
            path.display(),
            MAP_CACHE_VERSION
        );
        return BTreeMap::new();
    }
    snapshot.entries
}
