//! Incremental graph population
//!
//! Walks only files whose content actually changed (or everything, when
//! forced), re-extracting their direct imports and threading the
//! parent/entry-file bookkeeping through newly discovered children.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use taproot_cache::ChangeCache;
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::extractor::DependencyExtractor;
use crate::graph::ModuleGraph;
use crate::node::ModuleNode;
use crate::paths;

const EXTERNAL_PACKAGE_DIR: &str = "node_modules";

/// Expand the graph from `start`, depth-first.
///
/// Children of a visited node are replaced from a fresh extraction when the
/// node changed on disk (always, when `force` is set); parents and
/// entry-file sets only accumulate. A seen-set marked on push terminates
/// cycles and keeps diamond paths from re-enqueuing a node.
pub(crate) fn populate(
    graph: &mut ModuleGraph,
    changes: &mut ChangeCache,
    extractor: &dyn DependencyExtractor,
    cwd: &Path,
    start: &BTreeSet<String>,
    force: bool,
) -> Result<()> {
    let mut stack: Vec<(String, Option<String>)> = Vec::new();
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for filename in start {
        if !graph.contains(filename) {
            continue;
        }
        let anchor = graph.is_entry_file(filename).then(|| filename.clone());
        if seen.insert(filename.clone()) {
            stack.push((filename.clone(), anchor));
        }
    }

    while let Some((filename, anchor)) = stack.pop() {
        // A diamond sibling's re-extraction may have cascaded this node away.
        if !graph.contains(&filename) {
            continue;
        }

        // Query the change cache even when forced, so every visited file is
        // tracked and reconciled into the next baseline.
        let disk_changed = changes.has_changed(&filename);
        let ordered_children = if force || disk_changed {
            trace!("extracting dependencies of {}", filename);
            let extracted = extractor
                .extract(Path::new(&filename), cwd)
                .map_err(|source| Error::Extractor {
                    path: PathBuf::from(&filename),
                    source,
                })?;
            let children = resolve_children(extracted, cwd)?;
            replace_children(graph, &filename, &children);
            children
        } else {
            graph
                .get(&filename)
                .map(|node| node.children.iter().cloned().collect())
                .unwrap_or_default()
        };

        for child in ordered_children {
            if !graph.contains(&child) {
                graph.set(ModuleNode::new(child.clone()));
            }
            if let Some(child_node) = graph.get_mut(&child) {
                if let Some(anchor) = &anchor {
                    // An entry file never lists itself among its entries.
                    if *anchor != child {
                        child_node.entry_files.insert(anchor.clone());
                    }
                }
                child_node.parents.insert(filename.clone());
            }
            if seen.insert(child.clone()) {
                stack.push((child.clone(), anchor.clone()));
            }
        }
    }

    Ok(())
}

/// Canonicalize extracted paths into graph keys, in extractor order,
/// dropping empties, duplicates, and anything under an external-package
/// directory.
fn resolve_children(extracted: Vec<PathBuf>, cwd: &Path) -> Result<Vec<String>> {
    let mut children = Vec::with_capacity(extracted.len());
    for path in extracted {
        if path.as_os_str().is_empty() {
            continue;
        }
        if path
            .components()
            .any(|c| c.as_os_str() == EXTERNAL_PACKAGE_DIR)
        {
            continue;
        }
        let key = paths::key_for(&path, cwd)?;
        if !children.contains(&key) {
            children.push(key);
        }
    }
    Ok(children)
}

/// Swap in a freshly-extracted child set, detaching this node from children
/// it no longer imports. A detached child left with no parents is abandoned
/// and cascade-deleted, unless it is an entry file.
fn replace_children(graph: &mut ModuleGraph, filename: &str, children: &[String]) {
    let new_set: BTreeSet<String> = children.iter().cloned().collect();
    let old_set = graph
        .get(filename)
        .map(|node| node.children.clone())
        .unwrap_or_default();

    if let Some(node) = graph.get_mut(filename) {
        node.children = new_set.clone();
    }

    for dropped in old_set.difference(&new_set) {
        let parentless = match graph.get_mut(dropped) {
            Some(dropped_node) => {
                dropped_node.parents.remove(filename);
                dropped_node.parents.is_empty()
            }
            None => false,
        };
        if parentless && !graph.is_entry_file(dropped) {
            debug!("abandoning {} (last importer was {})", dropped, filename);
            graph.delete(dropped);
        }
    }
}
