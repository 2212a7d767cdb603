//! Strict-mode revert: undo a boundary-violating write by restoring the
//! file from its last committed revision, or deleting it if it was never
//! tracked (`spec.md` §4.5 "Strict revert").

use std::path::Path;
use std::process::Command;

/// Capture `absolute_path`'s current (violating) contents, then restore
/// it from `HEAD` if tracked by version control, or delete it if not.
/// Any VCS/I/O failure along the way is swallowed — the captured content
/// (or `None` if the file didn't exist) is returned regardless.
pub fn revert_file(absolute_path: &Path, project_root: &Path) -> Option<String> {
    let captured = std::fs::read_to_string(absolute_path).ok();

    let Ok(relative) = absolute_path.strip_prefix(project_root) else {
        return captured;
    };
    if !has_vcs(project_root) {
        return captured;
    }
    let relative = relative.to_string_lossy().replace('\\', "/");

    if is_tracked(project_root, &relative) {
        let _ = git_cmd(project_root, &["checkout", "HEAD", "--", &relative]);
    } else {
        let _ = std::fs::remove_file(absolute_path);
    }

    captured
}

fn has_vcs(work_dir: &Path) -> bool {
    git_cmd(work_dir, &["rev-parse", "--is-inside-work-tree"]).is_ok()
}

fn is_tracked(work_dir: &Path, relative: &str) -> bool {
    git_cmd(work_dir, &["ls-files", "--error-unmatch", relative]).is_ok()
}

fn git_cmd(work_dir: &Path, args: &[&str]) -> Result<String, ()> {
    let output = Command::new("git")
        .args(args)
        .current_dir(work_dir)
        .output()
        .map_err(|_| ())?;
    if !output.status.success() {
        return Err(());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
