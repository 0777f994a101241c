//! JavaScript/TypeScript import scanner
//!
//! Line-oriented specifier scanning rather than a full parse: static
//! `import`/`export … from`, CommonJS `require()`, and dynamic `import()`.
//! Only relative (and absolute-path) specifiers resolve to files; bare
//! package specifiers are outside local discovery and are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use taproot_core::extractor::{DependencyExtractor, ExtractorError};
use taproot_core::paths;

use crate::{IgnoreRules, ResolveError};

const RESOLVE_EXTENSIONS: &[&str] = &[".js", ".jsx", ".ts", ".tsx", ".mjs", ".cjs"];
const MODULE_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

static STATIC_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*import\s+(?:[^'"]*?\s+from\s+)?['"]([^'"]+)['"]"#).unwrap()
});

static EXPORT_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*export\s+[^'"]*?\s+from\s+['"]([^'"]+)['"]"#).unwrap()
});

static CALL_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:require|import)\s*\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap()
});

/// The shipped [`DependencyExtractor`] for JS/TS module files. Files with
/// other extensions extract to nothing.
pub struct JsModuleResolver {
    ignore: IgnoreRules,
}

impl JsModuleResolver {
    pub fn new() -> Self {
        JsModuleResolver {
            ignore: IgnoreRules::empty(),
        }
    }

    pub fn with_ignored<I, S>(patterns: I) -> Result<Self, ResolveError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(JsModuleResolver {
            ignore: IgnoreRules::new(patterns)?,
        })
    }
}

impl Default for JsModuleResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyExtractor for JsModuleResolver {
    fn extract(&self, file: &Path, cwd: &Path) -> Result<Vec<PathBuf>, ExtractorError> {
        if !is_module_file(file) {
            return Ok(Vec::new());
        }
        let source = fs::read_to_string(file).map_err(|source| ResolveError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let dir = file.parent().unwrap_or(cwd);

        let mut deps = Vec::new();
        for specifier in scan_specifiers(&source) {
            if !is_local(&specifier) {
                trace!("skipping package import {} in {}", specifier, file.display());
                continue;
            }
            let Some(resolved) = resolve_specifier(dir, &specifier) else {
                debug!(
                    "unresolved import {} in {}",
                    specifier,
                    file.display()
                );
                continue;
            };
            if self.ignore.is_ignored(&resolved) {
                continue;
            }
            if !deps.contains(&resolved) {
                deps.push(resolved);
            }
        }
        Ok(deps)
    }
}

fn is_module_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

/// Every specifier string in the source, static forms first, call forms
/// after, each in source order.
fn scan_specifiers(source: &str) -> Vec<String> {
    let mut specifiers = Vec::new();
    for re in [&*STATIC_IMPORT, &*EXPORT_FROM, &*CALL_IMPORT] {
        for captures in re.captures_iter(source) {
            specifiers.push(captures[1].to_string());
        }
    }
    specifiers
}

fn is_local(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../") || specifier.starts_with('/')
}

/// Node-style resolution for a local specifier: the exact path, then with
/// each known extension appended, then as a directory with an index file.
fn resolve_specifier(dir: &Path, specifier: &str) -> Option<PathBuf> {
    let base = if specifier.starts_with('/') {
        PathBuf::from(specifier)
    } else {
        dir.join(specifier)
    };
    let base = paths::normalize(&base);

    if base.is_file() {
        return Some(base);
    }
    for ext in RESOLVE_EXTENSIONS {
        let with_ext = append_extension(&base, ext);
        if with_ext.is_file() {
            return Some(with_ext);
        }
    }
    if base.is_dir() {
        for ext in RESOLVE_EXTENSIONS {
            let index = base.join(format!("index{ext}"));
            if index.is_file() {
                return Some(index);
            }
        }
    }
    None
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(ext);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, rel: &str, content: &str) -> PathBuf {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn scans_all_import_forms() {
        let specifiers = scan_specifiers(
            r#"
import './a';
import def from "./b";
import { x, y } from './c';
export * from './d';
export { z } from './e';
const f = require('./f');
const g = await import('./g');
"#,
        );
        assert_eq!(
            specifiers,
            vec!["./a", "./b", "./c", "./d", "./e", "./f", "./g"]
        );
    }

    #[test]
    fn plain_exports_and_strings_are_not_imports() {
        let specifiers = scan_specifiers(
            r#"
export const name = 'nobody';
const s = "just a string";
export { local };
"#,
        );
        assert!(specifiers.is_empty());
    }

    #[test]
    fn resolves_relative_imports_with_extension_probing() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "src/app.js", "import './util';\nimport '../shared';\n");
        let util = write(&dir, "src/util.ts", "export {};\n");
        let shared = write(&dir, "shared.js", "export {};\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert_eq!(deps, vec![util, shared]);
    }

    #[test]
    fn resolves_directory_imports_to_index() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "app.js", "import './lib';\n");
        let index = write(&dir, "lib/index.ts", "export {};\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert_eq!(deps, vec![index]);
    }

    #[test]
    fn package_imports_are_skipped() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "app.js", "import react from 'react';\nimport './b';\n");
        let b = write(&dir, "b.js", "export {};\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert_eq!(deps, vec![b]);
    }

    #[test]
    fn unresolvable_imports_are_dropped() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "app.js", "import './missing';\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn duplicate_imports_are_deduped() {
        let dir = TempDir::new().unwrap();
        let entry = write(
            &dir,
            "app.js",
            "import { a } from './b';\nimport { c } from './b';\n",
        );
        let b = write(&dir, "b.js", "export {};\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert_eq!(deps, vec![b]);
    }

    #[test]
    fn ignored_globs_are_honored() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "app.js", "import './generated/api';\nimport './b';\n");
        write(&dir, "generated/api.js", "export {};\n");
        let b = write(&dir, "b.js", "export {};\n");

        let resolver = JsModuleResolver::with_ignored(["**/generated/**"]).unwrap();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert_eq!(deps, vec![b]);
    }

    #[test]
    fn non_module_files_extract_to_nothing() {
        let dir = TempDir::new().unwrap();
        let entry = write(&dir, "styles.css", "@import './other.css';\n");

        let resolver = JsModuleResolver::new();
        let deps = resolver.extract(&entry, dir.path()).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let resolver = JsModuleResolver::new();
        let missing = dir.path().join("missing.js");
        assert!(resolver.extract(&missing, dir.path()).is_err());
    }
}
