//! CLI command implementations

use std::path::PathBuf;

use taproot_cache::{ChangeCache, MapCache};
use taproot_core::{DependencyMap, MapConfig, ModuleNode};
use taproot_resolver::JsModuleResolver;

pub fn index(
    entries: Vec<PathBuf>,
    cache_dir: PathBuf,
    reset: bool,
    ignored: Vec<String>,
    cwd: Option<PathBuf>,
) -> anyhow::Result<()> {
    let map = build_map(entries, cache_dir, reset, ignored, cwd)?;
    tracing::info!(
        "mapped {} modules from {} entry files",
        map.graph().len(),
        map.graph().entry_files().len()
    );
    Ok(())
}

pub fn affected(
    entries: Vec<PathBuf>,
    cache_dir: PathBuf,
    changed: Vec<PathBuf>,
    mark_changed: Vec<PathBuf>,
    ignored: Vec<String>,
    cwd: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut map = build_map(entries, cache_dir, false, ignored, cwd)?;

    // initialize has already reconciled the change baseline, so an
    // unspecified change set means the window it captured on the way in
    let changed: Vec<PathBuf> = if changed.is_empty() {
        map.changed_since_initialize()
            .iter()
            .map(PathBuf::from)
            .collect()
    } else {
        changed
    };

    let result = map.affected_entry_files(changed, mark_changed)?;
    for entry in &result.entry_files {
        println!("{}", entry);
    }
    tracing::info!(
        "{} affected entry files ({} affected files in total)",
        result.entry_files.len(),
        result.all.len()
    );

    map.save()?;
    Ok(())
}

pub fn clear(cache_dir: PathBuf) -> anyhow::Result<()> {
    let mut graph_cache: MapCache<ModuleNode> =
        MapCache::open(cache_dir.join(taproot_core::MODULE_MAP_CACHE_FILENAME));
    graph_cache.destroy()?;

    let mut changes = ChangeCache::open(cache_dir.join(taproot_core::FILE_ENTRY_CACHE_FILENAME));
    changes.destroy()?;

    tracing::info!("caches cleared under {}", cache_dir.display());
    Ok(())
}

fn build_map(
    entries: Vec<PathBuf>,
    cache_dir: PathBuf,
    reset: bool,
    ignored: Vec<String>,
    cwd: Option<PathBuf>,
) -> anyhow::Result<DependencyMap> {
    let resolver = JsModuleResolver::with_ignored(&ignored)?;
    let config = MapConfig {
        cache_dir,
        reset,
        entry_files: entries,
        ignored,
        cwd: match cwd {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        },
        ..Default::default()
    };
    Ok(DependencyMap::new(config, Box::new(resolver))?)
}
