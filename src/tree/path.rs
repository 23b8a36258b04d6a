//! Path order and path conversion utilities
//!
//! Records are keyed by a `/`-separated path relative to the tree root. Both
//! the walker and the database are sorted by *path order*: parent directory
//! first, compared component by component, then file name. This is the order
//! of a depth-first walk that lists a directory's files before descending into
//! its sorted subdirectories.

use crate::error::StorageError;
use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

/// Split a relative path into its parent directory and file name.
///
/// Files at the root have an empty parent.
pub fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

fn components(dir: &str) -> impl Iterator<Item = &str> {
    dir.split('/').filter(|c| !c.is_empty())
}

/// Total order shared by the walker, the database and the writer.
pub fn path_order(a: &str, b: &str) -> Ordering {
    let (a_dir, a_name) = split_parent(a);
    let (b_dir, b_name) = split_parent(b);

    // `a/b` must sort before `a-b`: a plain string compare would look at '/'
    // against '-' and disagree with the walk.
    components(a_dir)
        .cmp(components(b_dir))
        .then_with(|| a_name.cmp(b_name))
}

/// Convert a path below `root` to the `/`-separated relative form.
///
/// Returns `None` when `full` is not below `root` or a component is not UTF-8.
pub fn relative_path(root: &Path, full: &Path) -> Option<String> {
    let rel = full.strip_prefix(root).ok()?;
    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(name) => parts.push(name.to_str()?),
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Resolve a relative record path below `root` for I/O.
pub fn to_native(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in components(relative) {
        path.push(part);
    }
    path
}

/// Canonicalize a directory used as tree root or copy location.
///
/// Uses `dunce` so that Windows paths stay in their familiar form.
pub fn canonicalize_path(path: &Path) -> Result<PathBuf, StorageError> {
    dunce::canonicalize(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::PathNotFound(path.to_path_buf())
        } else {
            StorageError::io(path, e)
        }
    })
}
