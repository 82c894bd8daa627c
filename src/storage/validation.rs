//! Path validation
//!
//! Keeps file requests inside the served directory.

use std::path::{Component, Path, PathBuf};

/// Resolve a requested file name to a path directly inside `root`.
///
/// Only a single plain component is accepted; separators, `.`, `..`, and
/// absolute paths resolve to `None`.
pub fn resolve_served_file(root: &Path, name: &str) -> Option<PathBuf> {
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(part)), None) if part == name => Some(root.join(part)),
        _ => None,
    }
}
