//! The dependency map: graph + caches + extractor across invocations
//!
//! One `DependencyMap` owns the in-memory graph, the two persistent caches,
//! and the extractor boundary. Construction runs the one-shot initialize
//! sequence; afterwards the map answers affected-entry-file queries and
//! persists on demand.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use taproot_cache::{ChangeCache, MapCache};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::error::{Error, Result};
use crate::extractor::DependencyExtractor;
use crate::graph::ModuleGraph;
use crate::node::ModuleNode;
use crate::paths;
use crate::populate::populate;
use crate::query::{affected_from_seeds, AffectedFiles};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MapState {
    Uninitialized,
    Initializing,
    Ready,
}

pub struct DependencyMap {
    graph: ModuleGraph,
    graph_cache: MapCache<ModuleNode>,
    changes: ChangeCache,
    extractor: Box<dyn DependencyExtractor>,
    cwd: PathBuf,
    state: MapState,
    reset: bool,
    entry_paths: Vec<PathBuf>,
    changed_at_init: BTreeSet<String>,
}

impl std::fmt::Debug for DependencyMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyMap")
            .field("graph", &self.graph)
            .field("cwd", &self.cwd)
            .field("state", &self.state)
            .finish()
    }
}

impl DependencyMap {
    /// Open the caches under `config.cache_dir` and run the one-shot
    /// initialize sequence. A failed initialize is fatal: the map is never
    /// handed out half-built.
    pub fn new(config: MapConfig, extractor: Box<dyn DependencyExtractor>) -> Result<Self> {
        let fallback_cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        let cwd = paths::absolutize(&config.cwd, &fallback_cwd)?;
        let graph_cache = MapCache::open(config.cache_dir.join(&config.module_map_cache_filename));
        let changes = ChangeCache::open(config.cache_dir.join(&config.file_entry_cache_filename));

        let mut map = DependencyMap {
            graph: ModuleGraph::new(),
            graph_cache,
            changes,
            extractor,
            cwd,
            state: MapState::Uninitialized,
            reset: config.reset,
            entry_paths: config.entry_files,
            changed_at_init: BTreeSet::new(),
        };
        map.initialize()?;
        Ok(map)
    }

    /// The one-shot initialize sequence. Runs exactly once, from `new`;
    /// re-entry is an error.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != MapState::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        self.state = MapState::Initializing;

        if self.reset {
            info!("resetting caches before load");
            self.graph_cache.destroy()?;
            self.changes.destroy()?;
        }

        self.load(true);

        let mut new_entries = BTreeSet::new();
        for path in std::mem::take(&mut self.entry_paths) {
            let key = paths::key_for(&path, &self.cwd)?;
            self.graph.mark_entry_file(key.clone());
            if !self.graph.contains(&key) {
                self.graph.set(ModuleNode::new(key.clone()));
                new_entries.insert(key);
            }
        }

        let known: Vec<String> = self.graph.files().map(str::to_string).collect();
        let changed = self.changes.updated_among(known);
        debug!(
            "{} of {} known files changed since last run",
            changed.len(),
            self.graph.len()
        );
        self.changed_at_init = changed.clone();

        let mut start = changed;
        start.extend(new_entries);
        populate(
            &mut self.graph,
            &mut self.changes,
            &*self.extractor,
            &self.cwd,
            &start,
            true,
        )?;

        self.save()?;
        self.state = MapState::Ready;
        info!(
            "dependency map ready: {} modules, {} entry files",
            self.graph.len(),
            self.graph.entry_files().len()
        );
        Ok(())
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Mutable access to the underlying graph. Low-level; callers take on
    /// the edge-consistency bookkeeping themselves.
    pub fn graph_mut(&mut self) -> &mut ModuleGraph {
        &mut self.graph
    }

    /// Known files that differed from the change-cache baseline when this
    /// map initialized — the change window of the current invocation,
    /// retained because initialize reconciles the baseline away.
    pub fn changed_since_initialize(&self) -> &BTreeSet<String> {
        &self.changed_at_init
    }

    /// Overlay the persisted snapshot onto the in-memory graph. With
    /// `destructive`, the cache is authoritative and the in-memory graph is
    /// discarded first; otherwise same-filename nodes are overwritten and
    /// everything else is kept.
    pub fn load(&mut self, destructive: bool) {
        let records: Vec<ModuleNode> = self.graph_cache.all().values().cloned().collect();
        debug!(
            "loading {} cached records ({})",
            records.len(),
            if destructive { "destructive" } else { "merge" }
        );
        self.graph.load_records(records, destructive);
    }

    /// Designate `path` as an entry file. Creates and populates its node
    /// when the file is not yet known to the graph.
    pub fn add_entry_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let key = paths::key_for(path.as_ref(), &self.cwd)?;
        self.graph.mark_entry_file(key.clone());
        if !self.graph.contains(&key) {
            self.graph.set(ModuleNode::new(key.clone()));
            let start = BTreeSet::from([key]);
            populate(
                &mut self.graph,
                &mut self.changes,
                &*self.extractor,
                &self.cwd,
                &start,
                true,
            )?;
        }
        Ok(())
    }

    /// Persist both caches: every current node is written to the graph
    /// cache (stale keys pruned, so deleted files cannot resurrect) and the
    /// change cache commits the on-disk state as its new baseline. Errors
    /// surface without touching the in-memory graph.
    pub fn save(&mut self) -> Result<()> {
        let stale: Vec<String> = self
            .graph_cache
            .all()
            .keys()
            .filter(|key| !self.graph.contains(key))
            .cloned()
            .collect();
        for key in stale {
            self.graph_cache.remove_key(&key);
        }
        for node in self.graph.nodes() {
            self.graph_cache.set_key(node.filename.clone(), node.clone());
        }
        self.graph_cache.save()?;
        self.changes.reconcile(true)?;
        Ok(())
    }

    /// Which entry files must re-run, given `changed` files on disk?
    ///
    /// `mark_changed` paths are invalidated in the change cache first. An
    /// empty `changed` set falls back to asking the change cache which
    /// known files differ from its baseline. Seeds are re-populated
    /// (change-gated) before the reverse walk, since a changed file's
    /// imports may have moved. Nothing is persisted here; `save` commits.
    pub fn affected_entry_files(
        &mut self,
        changed: impl IntoIterator<Item = PathBuf>,
        mark_changed: impl IntoIterator<Item = PathBuf>,
    ) -> Result<AffectedFiles> {
        for path in mark_changed {
            let key = paths::key_for(&path, &self.cwd)?;
            self.changes.remove_entry(&key);
        }

        let mut change_set: Vec<String> = Vec::new();
        for path in changed {
            change_set.push(paths::key_for(&path, &self.cwd)?);
        }
        if change_set.is_empty() {
            let known: Vec<String> = self.graph.files().map(str::to_string).collect();
            change_set = self.changes.updated_among(known).into_iter().collect();
        }

        let seeds: BTreeSet<String> = change_set
            .into_iter()
            .filter(|key| self.graph.contains(key))
            .collect();
        if seeds.is_empty() {
            return Ok(AffectedFiles::default());
        }

        populate(
            &mut self.graph,
            &mut self.changes,
            &*self.extractor,
            &self.cwd,
            &seeds,
            false,
        )?;

        Ok(affected_from_seeds(&self.graph, &seeds))
    }
}
