//! Affected-files reverse reachability

use std::collections::BTreeSet;

use crate::graph::ModuleGraph;

/// Result of an affected-files query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffectedFiles {
    /// Every file that must be re-examined.
    pub all: BTreeSet<String>,
    /// The subset that are entry files; the answer the test runner acts on.
    pub entry_files: BTreeSet<String>,
}

impl AffectedFiles {
    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.entry_files.is_empty()
    }
}

/// For each seed S: `S.entry_files`, plus S itself when it is an entry
/// file, plus every transitive ancestor reached through `parents`. The
/// ancestor walk is an iterative DFS with a visited set per seed.
pub(crate) fn affected_from_seeds(graph: &ModuleGraph, seeds: &BTreeSet<String>) -> AffectedFiles {
    let mut all = BTreeSet::new();

    for seed in seeds {
        let Some(node) = graph.get(seed) else {
            continue;
        };
        all.extend(node.entry_files.iter().cloned());
        if graph.is_entry_file(seed) {
            all.insert(seed.clone());
        }

        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut stack: Vec<String> = node.parents.iter().cloned().collect();
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            all.insert(current.clone());
            if let Some(ancestor) = graph.get(&current) {
                for parent in &ancestor.parents {
                    if !visited.contains(parent) {
                        stack.push(parent.clone());
                    }
                }
            }
        }
    }

    let entry_files = all
        .intersection(graph.entry_files())
        .cloned()
        .collect();
    AffectedFiles { all, entry_files }
}
