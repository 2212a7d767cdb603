//! Path canonicalization and POSIX-style relative-path computation used
//! by `check_path_allowed` (`spec.md` §4.5 steps 1-3).

use std::path::{Component, Path, PathBuf};

/// Canonicalize `path`, following symlinks. Falls back to a purely
/// lexical normalization (collapsing `.` and `..` components without
/// touching the filesystem) if the path does not exist.
pub fn resolve(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| lexical_normalize(path))
}

fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The path from `root` to `target`, using POSIX separators and a `..`
/// prefix for every segment `target` climbs above `root`. Both paths are
/// expected to already be resolved (canonical or lexically normalized).
pub fn relative_path(target: &Path, root: &Path) -> String {
    let target_components: Vec<Component> = target.components().collect();
    let root_components: Vec<Component> = root.components().collect();

    let shared = target_components
        .iter()
        .zip(root_components.iter())
        .take_while(|(t, r)| t == r)
        .count();

    let mut result = PathBuf::new();
    for _ in shared..root_components.len() {
        result.push("..");
    }
    for component in &target_components[shared..] {
        result.push(component.as_os_str());
    }

    result.to_string_lossy().replace('\\', "/")
}
