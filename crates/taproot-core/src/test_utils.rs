//! Shared helpers for core tests

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::config::MapConfig;
use crate::extractor::{DependencyExtractor, ExtractorError};
use crate::graph::ModuleGraph;
use crate::map::DependencyMap;
use crate::node::ModuleNode;

/// Build a node from string slices.
pub fn node(
    filename: &str,
    children: &[&str],
    parents: &[&str],
    entry_files: &[&str],
) -> ModuleNode {
    ModuleNode::with_relations(
        filename,
        children.iter().copied(),
        parents.iter().copied(),
        entry_files.iter().copied(),
    )
}

pub fn set(paths: &[&str]) -> BTreeSet<String> {
    paths.iter().map(|p| p.to_string()).collect()
}

/// Extractor answering from a fixed filename → children table. Files not
/// in the table have no dependencies.
pub struct StubExtractor {
    deps: BTreeMap<String, Vec<String>>,
}

impl StubExtractor {
    pub fn new(pairs: &[(&str, &[&str])]) -> Self {
        let deps = pairs
            .iter()
            .map(|(file, children)| {
                (
                    (*file).to_string(),
                    children.iter().map(|c| (*c).to_string()).collect(),
                )
            })
            .collect();
        StubExtractor { deps }
    }
}

impl DependencyExtractor for StubExtractor {
    fn extract(&self, file: &Path, _cwd: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        Ok(self
            .deps
            .get(file.to_string_lossy().as_ref())
            .map(|children| children.iter().map(PathBuf::from).collect())
            .unwrap_or_default())
    }
}

/// Extractor that errors for one specific file.
pub struct FailingExtractor {
    pub fail_for: String,
}

impl DependencyExtractor for FailingExtractor {
    fn extract(&self, file: &Path, _cwd: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        if file.to_string_lossy() == self.fail_for {
            Err(format!("synthetic extractor failure for {}", self.fail_for).into())
        } else {
            Ok(Vec::new())
        }
    }
}

pub fn build_map(
    cache_dir: &Path,
    cwd: &Path,
    entries: &[&str],
    extractor: impl DependencyExtractor + 'static,
) -> crate::Result<DependencyMap> {
    let config = MapConfig {
        cache_dir: cache_dir.to_path_buf(),
        entry_files: entries.iter().map(PathBuf::from).collect(),
        cwd: cwd.to_path_buf(),
        ..Default::default()
    };
    DependencyMap::new(config, Box::new(extractor))
}

/// Assert the bidirectional edge invariant: `b` in `a.children` iff `a` in
/// `b.parents`, for every pair present in the graph.
pub fn assert_bidirectional(graph: &ModuleGraph) {
    for node in graph.nodes() {
        for child in &node.children {
            let child_node = graph
                .get(child)
                .unwrap_or_else(|| panic!("{} has dangling child {}", node.filename, child));
            assert!(
                child_node.parents.contains(&node.filename),
                "{} lists child {} but the child does not list it back",
                node.filename,
                child
            );
        }
        for parent in &node.parents {
            let parent_node = graph
                .get(parent)
                .unwrap_or_else(|| panic!("{} has dangling parent {}", node.filename, parent));
            assert!(
                parent_node.children.contains(&node.filename),
                "{} lists parent {} but the parent does not list it back",
                node.filename,
                parent
            );
        }
    }
}
