//! End-to-end tests: real source trees, the shipped resolver, and the
//! dependency map working together across invocations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use taproot_cache::MapCache;
use taproot_core::{DependencyMap, MapConfig, ModuleNode};
use taproot_resolver::JsModuleResolver;
use tempfile::TempDir;

fn write_file(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
}

fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn build_map(src: &Path, cache: &Path, entries: &[&str]) -> DependencyMap {
    build_map_with_ignored(src, cache, entries, &[])
}

fn build_map_with_ignored(
    src: &Path,
    cache: &Path,
    entries: &[&str],
    ignored: &[&str],
) -> DependencyMap {
    let resolver = JsModuleResolver::with_ignored(ignored.iter().copied()).unwrap();
    let config = MapConfig {
        cache_dir: cache.to_path_buf(),
        entry_files: entries.iter().map(PathBuf::from).collect(),
        ignored: ignored.iter().map(|s| s.to_string()).collect(),
        cwd: src.to_path_buf(),
        ..Default::default()
    };
    DependencyMap::new(config, Box::new(resolver)).unwrap()
}

#[test]
fn cold_start_maps_a_real_source_tree() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    let sum_test = write_file(src.path(), "sum.test.js", "import { sum } from './sum';\n");
    let mul_test = write_file(src.path(), "mul.test.js", "import { mul } from './mul';\n");
    write_file(
        src.path(),
        "sum.js",
        "import { add } from './util/add';\nexport const sum = add;\n",
    );
    write_file(
        src.path(),
        "mul.js",
        "import { add } from './util/add';\nexport const mul = add;\n",
    );
    let add = write_file(src.path(), "util/add.js", "export const add = (a, b) => a + b;\n");

    let map = build_map(src.path(), cache.path(), &["sum.test.js", "mul.test.js"]);
    let graph = map.graph();

    assert_eq!(graph.len(), 5);
    let add_node = graph.get(&key(&add)).unwrap();
    let expected: BTreeSet<String> = [key(&sum_test), key(&mul_test)].into_iter().collect();
    assert_eq!(add_node.entry_files, expected);
    assert!(add_node.children.is_empty());
}

#[test]
fn shared_dep_change_affects_both_entries() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    let sum_test = write_file(src.path(), "sum.test.js", "import './sum';\n");
    let mul_test = write_file(src.path(), "mul.test.js", "import './mul';\n");
    write_file(src.path(), "sum.js", "import './util/add';\n");
    write_file(src.path(), "mul.js", "import './util/add';\n");
    let add = write_file(src.path(), "util/add.js", "export const add = 0;\n");

    let mut map = build_map(src.path(), cache.path(), &["sum.test.js", "mul.test.js"]);
    let affected = map.affected_entry_files(vec![add.clone()], vec![]).unwrap();
    let expected: BTreeSet<String> = [key(&sum_test), key(&mul_test)].into_iter().collect();
    assert_eq!(affected.entry_files, expected);
}

#[test]
fn second_invocation_sees_the_change_window() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    let test = write_file(src.path(), "app.test.js", "import './app';\n");
    let app = write_file(src.path(), "app.js", "export const app = 1;\n");

    let first = build_map(src.path(), cache.path(), &["app.test.js"]);
    assert_eq!(first.graph().len(), 2);
    drop(first);

    // the app module grows a dependency between invocations
    write_file(src.path(), "app.js", "import './store';\nexport const app = 1;\n");
    let store = write_file(src.path(), "store.js", "export const store = {};\n");

    let mut second = build_map(src.path(), cache.path(), &["app.test.js"]);
    let expected: BTreeSet<String> = [key(&app)].into_iter().collect();
    assert_eq!(second.changed_since_initialize(), &expected);
    assert!(second.graph().contains(&key(&store)));

    let changed: Vec<PathBuf> = second
        .changed_since_initialize()
        .iter()
        .map(PathBuf::from)
        .collect();
    let expected: BTreeSet<String> = [key(&test)].into_iter().collect();
    let affected = second.affected_entry_files(changed, vec![]).unwrap();
    assert_eq!(affected.entry_files, expected);

    let affected_by_store = second
        .affected_entry_files(vec![store.clone()], vec![])
        .unwrap();
    assert_eq!(affected_by_store.entry_files, expected);
}

#[test]
fn dropped_import_disappears_from_graph_and_cache() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    write_file(src.path(), "app.test.js", "import './app';\n");
    write_file(src.path(), "app.js", "import './legacy';\n");
    let legacy = write_file(src.path(), "legacy.js", "export const legacy = true;\n");

    let first = build_map(src.path(), cache.path(), &["app.test.js"]);
    assert!(first.graph().contains(&key(&legacy)));
    drop(first);

    write_file(src.path(), "app.js", "export const app = 2;\n");

    let second = build_map(src.path(), cache.path(), &["app.test.js"]);
    assert!(!second.graph().contains(&key(&legacy)));
    drop(second);

    let persisted: MapCache<ModuleNode> =
        MapCache::open(cache.path().join(taproot_core::MODULE_MAP_CACHE_FILENAME));
    assert!(persisted.get(&key(&legacy)).is_none());
}

#[test]
fn unchanged_tree_reports_nothing_affected() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    write_file(src.path(), "app.test.js", "import './app';\n");
    write_file(src.path(), "app.js", "export const app = 1;\n");

    let first = build_map(src.path(), cache.path(), &["app.test.js"]);
    drop(first);

    let mut second = build_map(src.path(), cache.path(), &["app.test.js"]);
    assert!(second.changed_since_initialize().is_empty());
    let affected = second.affected_entry_files(vec![], vec![]).unwrap();
    assert!(affected.is_empty());
}

#[test]
fn ignored_globs_keep_generated_code_out_of_the_graph() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    write_file(
        src.path(),
        "app.test.js",
        "import './generated/api';\nimport './app';\n",
    );
    let generated = write_file(src.path(), "generated/api.js", "export const api = {};\n");
    let app = write_file(src.path(), "app.js", "export const app = 1;\n");

    let map = build_map_with_ignored(
        src.path(),
        cache.path(),
        &["app.test.js"],
        &["**/generated/**"],
    );
    assert!(!map.graph().contains(&key(&generated)));
    assert!(map.graph().contains(&key(&app)));
}

#[test]
fn external_packages_stay_out_of_the_graph() {
    let src = TempDir::new().unwrap();
    let cache = TempDir::new().unwrap();

    write_file(
        src.path(),
        "app.test.js",
        "import react from 'react';\nimport pkg from './node_modules/pkg/index.js';\nimport './app';\n",
    );
    write_file(src.path(), "node_modules/pkg/index.js", "export default {};\n");
    let app = write_file(src.path(), "app.js", "export const app = 1;\n");

    let map = build_map(src.path(), cache.path(), &["app.test.js"]);
    assert_eq!(map.graph().len(), 2);
    assert!(map.graph().contains(&key(&app)));
}

#[test]
fn cli_prints_help() {
    let output = Command::new("cargo")
        .args(["run", "--quiet", "--", "--help"])
        .current_dir(env!("CARGO_MANIFEST_DIR"))
        .output()
        .expect("failed to run the CLI");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("taproot"));
    assert!(stdout.contains("Incremental module dependency map"));
}
