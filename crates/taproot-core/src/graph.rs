//! In-memory bidirectional module graph

use std::collections::{BTreeMap, BTreeSet};

use crate::node::ModuleNode;

/// The module graph: one owning map from absolute path to node, plus the
/// set of designated entry files.
///
/// Edges are sets of string keys into `nodes`; traversal is repeated map
/// lookup. Mutating operations here keep the bidirectional-edge invariant
/// (`b` in `a.children` iff `a` in `b.parents`), with the documented
/// exception of [`ModuleGraph::set`].
#[derive(Clone, Default)]
pub struct ModuleGraph {
    nodes: BTreeMap<String, ModuleNode>,
    entry_files: BTreeSet<String>,
}

impl std::fmt::Debug for ModuleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleGraph")
            .field("node_count", &self.nodes.len())
            .field("entry_file_count", &self.entry_files.len())
            .finish()
    }
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&ModuleNode> {
        self.nodes.get(filename)
    }

    pub fn get_mut(&mut self, filename: &str) -> Option<&mut ModuleNode> {
        self.nodes.get_mut(filename)
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.nodes.contains_key(filename)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All known filenames, in lexicographic order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Iterate over all nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &ModuleNode> {
        self.nodes.values()
    }

    pub fn entry_files(&self) -> &BTreeSet<String> {
        &self.entry_files
    }

    pub fn is_entry_file(&self, filename: &str) -> bool {
        self.entry_files.contains(filename)
    }

    /// Record entry-file membership. Node creation is the caller's concern.
    pub fn mark_entry_file(&mut self, filename: impl Into<String>) -> bool {
        self.entry_files.insert(filename.into())
    }

    /// Insert or replace a node, keyed by its filename.
    ///
    /// Low-level: adjacent nodes' back-edges are NOT synchronized. The
    /// populator owns edge bookkeeping because only it knows which edges a
    /// traversal is adding.
    pub fn set(&mut self, node: ModuleNode) {
        self.nodes.insert(node.filename.clone(), node);
    }

    /// Remove a node, cascading to children it was the last parent of.
    ///
    /// Each child loses this node from its `parents`; a child left with no
    /// parents is deleted in turn, unless it is an entry file (entry files
    /// are roots and stay without parents). Each parent loses this node
    /// from its `children`. Missing filenames are silently skipped.
    pub fn delete(&mut self, filename: &str) {
        let Some(node) = self.nodes.remove(filename) else {
            return;
        };
        self.entry_files.remove(filename);
        for child in &node.children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parents.remove(filename);
                if child_node.parents.is_empty() && !self.entry_files.contains(child) {
                    self.delete(child);
                }
            }
        }
        for parent in &node.parents {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.remove(filename);
            }
        }
    }

    /// Install records from a persisted snapshot. `destructive` clears the
    /// graph first; otherwise loaded records overwrite same-filename nodes
    /// in place. Records are trusted as written by a previous save; no
    /// invariant check runs here.
    pub fn load_records<I>(&mut self, records: I, destructive: bool)
    where
        I: IntoIterator<Item = ModuleNode>,
    {
        if destructive {
            self.nodes.clear();
        }
        for record in records {
            self.set(record);
        }
    }

    /// Ordered filename → record mapping, suitable for cache I/O and
    /// equality comparison across runs.
    pub fn to_serialized(&self) -> BTreeMap<String, ModuleNode> {
        self.nodes.clone()
    }
}
