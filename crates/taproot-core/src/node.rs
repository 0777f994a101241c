//! Node value object for the module graph

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One file known to the dependency map, with its direct relations.
///
/// All relations are sets of absolute-path keys into the owning graph's
/// node map; there are no direct inter-node references. `BTreeSet` keeps
/// iteration and the serialized arrays in lexicographic order, so the wire
/// form is stable across runs.
#[derive(Debug, Clone, Default, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    /// Absolute path; the node's identity.
    pub filename: String,
    /// Files this file imports (forward edges).
    pub children: BTreeSet<String>,
    /// Files that import this file (reverse edges).
    pub parents: BTreeSet<String>,
    /// Entry files this node is reachable from. Never contains the node's
    /// own filename, even when the node is itself an entry file.
    pub entry_files: BTreeSet<String>,
}

impl ModuleNode {
    pub fn new(filename: impl Into<String>) -> Self {
        ModuleNode {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn with_relations<C, P, E>(
        filename: impl Into<String>,
        children: C,
        parents: P,
        entry_files: E,
    ) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        ModuleNode {
            filename: filename.into(),
            children: children.into_iter().map(Into::into).collect(),
            parents: parents.into_iter().map(Into::into).collect(),
            entry_files: entry_files.into_iter().map(Into::into).collect(),
        }
    }
}

/// Identity is the filename; two nodes for the same file are the same node.
impl PartialEq for ModuleNode {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}
