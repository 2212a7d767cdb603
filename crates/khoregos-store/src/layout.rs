//! On-disk layout shared by every crate that touches project-local state.
//!
//! Kept in one place (the lowest-level crate) so no other crate
//! hardcodes `.khoregos/...` path fragments, mirroring the teacher's
//! convention of centralizing shared path helpers next to the storage
//! layer that owns the directory.

use std::path::{Path, PathBuf};

/// Directory name, relative to the project root, holding all Khoregos state.
pub const STATE_DIR: &str = ".khoregos";

/// Single-file relational database, mode 0600.
pub const DB_FILE: &str = "k6s.db";

/// Hex-encoded 32-byte HMAC key, mode 0600.
pub const SIGNING_KEY_FILE: &str = "signing.key";

/// JSON `{session_id}` lifecycle flag, mode 0600.
pub const DAEMON_STATE_FILE: &str = "daemon.state";

/// PID of any telemetry listener bound by a lifecycle process.
pub const TELEMETRY_PID_FILE: &str = "telemetry.pid";

pub fn state_dir(project_root: impl AsRef<Path>) -> PathBuf {
    project_root.as_ref().join(STATE_DIR)
}

pub fn db_path(project_root: impl AsRef<Path>) -> PathBuf {
    state_dir(project_root).join(DB_FILE)
}

pub fn signing_key_path(project_root: impl AsRef<Path>) -> PathBuf {
    state_dir(project_root).join(SIGNING_KEY_FILE)
}

pub fn daemon_state_path(project_root: impl AsRef<Path>) -> PathBuf {
    state_dir(project_root).join(DAEMON_STATE_FILE)
}

pub fn telemetry_pid_path(project_root: impl AsRef<Path>) -> PathBuf {
    state_dir(project_root).join(TELEMETRY_PID_FILE)
}
