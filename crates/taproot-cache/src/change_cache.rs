//! File change detection backed by a size/mtime/hash snapshot

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

const CHANGE_CACHE_VERSION: u32 = 1;

/// What we remembered about a file the last time the cache reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStamp {
    pub size: u64,
    pub mtime_ms: u64,
    pub hash: String,
}

#[derive(Deserialize)]
struct Snapshot {
    version: u32,
    #[allow(dead_code)]
    cached_at: String,
    entries: BTreeMap<String, FileStamp>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    cached_at: String,
    entries: &'a BTreeMap<String, FileStamp>,
}

/// Detects which tracked files differ from the last reconciled snapshot.
///
/// A path with no snapshot entry, or one that cannot be read, counts as
/// changed: the caller re-examines it and the next `reconcile` settles the
/// question. Queries never mutate the snapshot; they only record which
/// paths are being tracked so `reconcile` knows what to restamp.
#[derive(Debug)]
pub struct ChangeCache {
    path: PathBuf,
    entries: BTreeMap<String, FileStamp>,
    tracked: BTreeSet<String>,
}

impl ChangeCache {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        let tracked = entries.keys().cloned().collect();
        ChangeCache {
            path,
            entries,
            tracked,
        }
    }

    /// Has `path` changed on disk since the last reconcile?
    pub fn has_changed(&mut self, path: &str) -> bool {
        self.tracked.insert(path.to_string());
        match self.entries.get(path) {
            None => true,
            Some(stamp) => !stamp_matches(Path::new(path), stamp),
        }
    }

    /// The subset of `paths` that differ from the snapshot.
    pub fn updated_among<I, S>(&mut self, paths: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut updated = BTreeSet::new();
        for path in paths {
            let path = path.into();
            if self.has_changed(&path) {
                updated.insert(path);
            }
        }
        updated
    }

    /// Forget the snapshot for `path`, so it reads as changed next query.
    pub fn remove_entry(&mut self, path: &str) {
        self.tracked.insert(path.to_string());
        self.entries.remove(path);
    }

    /// Commit the current on-disk state of every tracked path as the new
    /// baseline. Paths that no longer exist are dropped from the snapshot.
    pub fn reconcile(&mut self, persist: bool) -> Result<()> {
        let mut entries = BTreeMap::new();
        for path in &self.tracked {
            match stamp_file(Path::new(path)) {
                Some(stamp) => {
                    entries.insert(path.clone(), stamp);
                }
                None => debug!("dropping vanished file from change cache: {}", path),
            }
        }
        self.entries = entries;
        if persist {
            self.save()?;
        }
        Ok(())
    }

    /// Drop all state and delete the backing file.
    pub fn destroy(&mut self) -> Result<()> {
        self.entries.clear();
        self.tracked.clear();
        crate::remove_cache_file(&self.path)
    }

    fn save(&self) -> Result<()> {
        let snapshot = SnapshotRef {
            version: CHANGE_CACHE_VERSION,
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
        debug!("change cache saved: {}", self.path.display());
        Ok(())
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, FileStamp> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(_) => {
            debug!("no change cache at {}, cold start", path.display());
            return BTreeMap::new();
        }
    };
    let snapshot: Snapshot = match serde_json::from_str(&data) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(
                "unreadable change cache at {}: {}, cold start",
                path.display(),
                e
            );
            return BTreeMap::new();
        }
    };
    if snapshot.version != CHANGE_CACHE_VERSION {
        warn!(
            "change cache version {} at {} does not match {}, cold start",
            snapshot.version,
            path.display(),
            CHANGE_CACHE_VERSION
        );
        return BTreeMap::new();
    }
    snapshot.entries
}

/// Size and mtime decide when they can; the hash settles a same-size file
/// whose mtime moved (editors that rewrite without changing content).
fn stamp_matches(path: &Path, stamp: &FileStamp) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if meta.len() != stamp.size {
        return false;
    }
    let mtime_ms = mtime_millis(&meta);
    if mtime_ms == stamp.mtime_ms {
        return true;
    }
    match hash_file(path) {
        Some(hash) => hash == stamp.hash,
        None => false,
    }
}

fn stamp_file(path: &Path) -> Option<FileStamp> {
    let meta = fs::metadata(path).ok()?;
    let hash = hash_file(path)?;
    Some(FileStamp {
        size: meta.len(),
        mtime_ms: mtime_millis(&meta),
        hash,
    })
}

fn mtime_millis(meta: &fs::Metadata) -> u64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn hash_file(path: &Path) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    Some(format!("{:x}", Sha256::digest(&bytes)))
}
