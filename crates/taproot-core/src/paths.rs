//! Path canonicalization helpers
//!
//! Node identity is the lexically-normalized absolute path, so every input
//! path funnels through here before it is used as a graph key. Lexical
//! normalization (no symlink resolution, no disk access) keeps keys stable
//! whether or not the file currently exists.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = path.components().peekable();
    let mut out = if let Some(c @ Component::Prefix(..)) = components.peek().copied() {
        components.next();
        PathBuf::from(c.as_os_str())
    } else {
        PathBuf::new()
    };
    for component in components {
        match component {
            Component::Prefix(..) => unreachable!(),
            Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(c) => out.push(c),
        }
    }
    out
}

/// Resolve `path` against `cwd` and normalize. Errors when the result is
/// still not absolute (a relative `cwd` cannot anchor anything).
pub fn absolutize(path: &Path, cwd: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let normalized = normalize(&joined);
    if normalized.is_absolute() {
        Ok(normalized)
    } else {
        Err(Error::InvalidPath {
            path: path.to_path_buf(),
        })
    }
}

/// The graph key for an absolute path.
pub fn key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Resolve straight to a graph key.
pub fn key_for(path: &Path, cwd: &Path) -> Result<String> {
    Ok(key(&absolutize(path, cwd)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_dots() {
        assert_eq!(
            normalize(Path::new("/p/src/./../lib/a.js")),
            PathBuf::from("/p/lib/a.js")
        );
    }

    #[test]
    fn absolutize_anchors_relative_paths() {
        let abs = absolutize(Path::new("src/a.js"), Path::new("/p")).unwrap();
        assert_eq!(abs, PathBuf::from("/p/src/a.js"));
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let abs = absolutize(Path::new("/q/b.js"), Path::new("/p")).unwrap();
        assert_eq!(abs, PathBuf::from("/q/b.js"));
    }

    #[test]
    fn relative_cwd_is_rejected() {
        assert!(absolutize(Path::new("a.js"), Path::new("rel")).is_err());
    }
}
