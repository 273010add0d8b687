//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `slash` - OS-independent separators for cache keys and module ids
//! - `normalize_lexically` - resolve `.` and `..` without touching the filesystem
//! - `relative_to` - strip a root prefix, falling back to the path itself
//! - `resolve_sibling` - resolve a `src` reference next to its owning document

use std::path::{Component, Path, PathBuf};

/// Convert a path to a forward-slash string.
///
/// Extended-length Windows paths (`\\?\`) are returned untouched since their
/// backslashes are significant.
///
/// # Example
/// ```ignore
/// assert_eq!(slash(Path::new("src\\App.vue")), "src/App.vue");
/// ```
#[inline]
pub fn slash(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.starts_with(r"\\?\") {
        return raw.into_owned();
    }
    raw.replace('\\', "/")
}

/// Resolve `.` and `..` components lexically.
///
/// Leading `..` components of a relative path are preserved.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Get `path` relative to `root`.
///
/// Falls back to the path itself when it is not under `root`.
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Resolve a `src` attribute relative to the document that references it.
///
/// Absolute references are returned as-is.
pub fn resolve_sibling(document: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        return reference.to_path_buf();
    }
    let dir = document.parent().unwrap_or_else(|| Path::new(""));
    normalize_lexically(&dir.join(reference))
}
