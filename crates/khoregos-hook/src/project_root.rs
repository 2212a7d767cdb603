//! Project-root resolution (`spec.md` §4.7, §6): find the governed
//! project that owns the current working directory by locating a live
//! `.khoregos/daemon.state` file at the cwd, an ancestor, or an
//! immediate child directory, in that order.

use std::path::{Path, PathBuf};

use khoregos_store::layout;

pub fn resolve_project_root(cwd: &Path) -> Option<PathBuf> {
    for candidate in cwd.ancestors() {
        if has_daemon_state(candidate) {
            return Some(candidate.to_path_buf());
        }
    }

    let entries = std::fs::read_dir(cwd).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() && has_daemon_state(&path) {
            return Some(path);
        }
    }
    None
}

/// Read the live internal session id out of `daemon.state`. Its absence
/// or malformedness means there is no running session to attribute
/// events to, which the pipeline treats as a no-op rather than an error.
pub fn read_live_session_id(project_root: &Path) -> Option<String> {
    let raw = std::fs::read_to_string(layout::daemon_state_path(project_root)).ok()?;
    let value: serde_json::Value = serde_json::from_str(&raw).ok()?;
    value.get("session_id")?.as_str().map(str::to_string)
}

fn has_daemon_state(dir: &Path) -> bool {
    layout::daemon_state_path(dir).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_daemon_state(dir: &Path, session_id: &str) {
        fs::create_dir_all(dir.join(layout::STATE_DIR)).unwrap();
        fs::write(
            layout::daemon_state_path(dir),
            format!(r#"{{"session_id":"{session_id}"}}"#),
        )
        .unwrap();
    }

    #[test]
    fn resolves_from_cwd_itself() {
        let dir = tempfile::tempdir().unwrap();
        write_daemon_state(dir.path(), "sess-1");
        assert_eq!(resolve_project_root(dir.path()), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn resolves_from_an_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        write_daemon_state(dir.path(), "sess-1");
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(resolve_project_root(&nested), Some(dir.path().to_path_buf()));
    }

    #[test]
    fn resolves_from_an_immediate_child() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("service");
        fs::create_dir_all(&child).unwrap();
        write_daemon_state(&child, "sess-1");
        assert_eq!(resolve_project_root(dir.path()), Some(child));
    }

    #[test]
    fn returns_none_when_nothing_found() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_project_root(dir.path()), None);
    }

    #[test]
    fn reads_session_id_from_daemon_state() {
        let dir = tempfile::tempdir().unwrap();
        write_daemon_state(dir.path(), "sess-42");
        assert_eq!(read_live_session_id(dir.path()), Some("sess-42".to_string()));
    }
}
