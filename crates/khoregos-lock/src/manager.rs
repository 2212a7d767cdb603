//! `FileLockManager` — exclusive, TTL-bounded per-path ownership
//! (`spec.md` §4.6). Every mutating method runs inside one database
//! transaction; the single-writer store makes that sufficient for
//! atomic compare-and-swap without an application-level mutex, the same
//! idiom `khoregos-store` itself uses for connection-wide serialization.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use khoregos_store::model::FileLock;
use khoregos_store::Store;
use rusqlite::OptionalExtension;

use crate::Result;

pub const DEFAULT_DURATION_SECONDS: i64 = 300;

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Result of a lock acquisition or release attempt. A denial is a typed
/// outcome, not an error (`spec.md` §7 "Lock").
#[derive(Debug, Clone)]
pub struct LockOutcome {
    pub success: bool,
    pub reason: Option<String>,
    pub lock: Option<FileLock>,
}

impl LockOutcome {
    fn granted(lock: FileLock) -> Self {
        Self { success: true, reason: None, lock: Some(lock) }
    }

    fn released() -> Self {
        Self { success: true, reason: None, lock: None }
    }

    fn denied(reason: impl Into<String>) -> Self {
        Self { success: false, reason: Some(reason.into()), lock: None }
    }
}

pub struct FileLockManager {
    store: Arc<Store>,
    session_id: String,
}

impl FileLockManager {
    pub fn new(store: Arc<Store>, session_id: impl Into<String>) -> Self {
        Self { store, session_id: session_id.into() }
    }

    /// Acquire an exclusive lock on `path` for `agent_id`, defaulting to
    /// a 300-second TTL. Extends the TTL if `agent_id` already holds the
    /// lock; reaps it first if it has expired.
    pub fn acquire(
        &self,
        path: &str,
        agent_id: &str,
        duration_seconds: Option<i64>,
    ) -> Result<LockOutcome> {
        let duration = duration_seconds.unwrap_or(DEFAULT_DURATION_SECONDS);
        let path = path.to_string();
        let agent_id = agent_id.to_string();
        let session_id = self.session_id.clone();

        Ok(self.store.transaction(move |conn| {
            let existing: Option<FileLock> = conn
                .query_row(
                    "SELECT * FROM file_locks WHERE path = ?1",
                    rusqlite::params![path],
                    FileLock::from_row,
                )
                .optional()?;

            if let Some(lock) = existing {
                if !lock.is_live(Utc::now()) {
                    conn.execute("DELETE FROM file_locks WHERE path = ?1", rusqlite::params![path])?;
                } else if lock.agent_id == agent_id {
                    let expires_at = Utc::now() + chrono::Duration::seconds(duration);
                    conn.execute(
                        "UPDATE file_locks SET expires_at = ?1 WHERE path = ?2",
                        rusqlite::params![format_timestamp(expires_at), path],
                    )?;
                    let extended = conn.query_row(
                        "SELECT * FROM file_locks WHERE path = ?1",
                        rusqlite::params![path],
                        FileLock::from_row,
                    )?;
                    return Ok(LockOutcome::granted(extended));
                } else {
                    return Ok(LockOutcome::denied(format!("locked by agent {}", lock.agent_id)));
                }
            }

            let lock = FileLock::new(path.clone(), session_id, agent_id, duration);
            conn.execute(
                "INSERT INTO file_locks (path, session_id, agent_id, acquired_at, expires_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    lock.path,
                    lock.session_id,
                    lock.agent_id,
                    format_timestamp(lock.acquired_at),
                    lock.expires_at.map(format_timestamp),
                ],
            )?;
            Ok(LockOutcome::granted(lock))
        })?)
    }

    /// Release `path` if held by `agent_id`. Idempotent: releasing a
    /// path with no lock reports success.
    pub fn release(&self, path: &str, agent_id: &str) -> Result<LockOutcome> {
        let path = path.to_string();
        let agent_id = agent_id.to_string();
        Ok(self.store.transaction(move |conn| {
            let existing: Option<FileLock> = conn
                .query_row(
                    "SELECT * FROM file_locks WHERE path = ?1",
                    rusqlite::params![path],
                    FileLock::from_row,
                )
                .optional()?;

            match existing {
                None => Ok(LockOutcome::released()),
                Some(lock) if lock.agent_id == agent_id => {
                    conn.execute("DELETE FROM file_locks WHERE path = ?1", rusqlite::params![path])?;
                    Ok(LockOutcome::released())
                }
                Some(lock) => Ok(LockOutcome::denied(format!("locked by agent {}", lock.agent_id))),
            }
        })?)
    }

    /// The live lock on `path`, if any, reaping it first if expired.
    pub fn check(&self, path: &str) -> Result<Option<FileLock>> {
        let path = path.to_string();
        Ok(self.store.transaction(move |conn| {
            let existing: Option<FileLock> = conn
                .query_row(
                    "SELECT * FROM file_locks WHERE path = ?1",
                    rusqlite::params![path],
                    FileLock::from_row,
                )
                .optional()?;
            match existing {
                Some(lock) if !lock.is_live(Utc::now()) => {
                    conn.execute("DELETE FROM file_locks WHERE path = ?1", rusqlite::params![path])?;
                    Ok(None)
                }
                other => Ok(other),
            }
        })?)
    }

    /// All live locks, optionally narrowed to one agent. Expired locks
    /// encountered along the way are reaped.
    pub fn list_locks(&self, agent_id: Option<&str>) -> Result<Vec<FileLock>> {
        let agent_id = agent_id.map(|s| s.to_string());
        Ok(self.store.transaction(move |conn| {
            let (live, expired): (Vec<FileLock>, Vec<FileLock>) = {
                let mut stmt = conn.prepare("SELECT * FROM file_locks")?;
                let mut rows = stmt.query([])?;
                let mut all = Vec::new();
                while let Some(row) = rows.next()? {
                    all.push(FileLock::from_row(row)?);
                }
                let now = Utc::now();
                all.into_iter().partition(|lock| lock.is_live(now))
            };

            for lock in &expired {
                conn.execute("DELETE FROM file_locks WHERE path = ?1", rusqlite::params![lock.path])?;
            }

            Ok(match &agent_id {
                Some(agent_id) => live.into_iter().filter(|l| &l.agent_id == agent_id).collect(),
                None => live,
            })
        })?)
    }

    pub fn release_all_for_agent(&self, agent_id: &str) -> Result<usize> {
        let agent_id = agent_id.to_string();
        Ok(self.store.transaction(move |conn| {
            Ok(conn.execute("DELETE FROM file_locks WHERE agent_id = ?1", rusqlite::params![agent_id])?)
        })?)
    }

    /// Release every lock held within this manager's session.
    pub fn release_all(&self) -> Result<usize> {
        let session_id = self.session_id.clone();
        Ok(self.store.transaction(move |conn| {
            Ok(conn.execute(
                "DELETE FROM file_locks WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?)
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn manager(dir: &std::path::Path) -> FileLockManager {
        let store = Arc::new(Store::new(dir));
        store.connect().unwrap();
        FileLockManager::new(store, "sess-1")
    }

    /// Scenario D — lock extension then cross-agent denial.
    #[test]
    fn extension_then_cross_agent_denial_then_handoff() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());

        let first = mgr.acquire("src/x.ts", "agent-1", None).unwrap();
        assert!(first.success);
        let second = mgr.acquire("src/x.ts", "agent-1", None).unwrap();
        assert!(second.success);

        let denied = mgr.acquire("src/x.ts", "agent-2", None).unwrap();
        assert!(!denied.success);
        assert!(denied.reason.unwrap().contains("locked by agent"));

        let released = mgr.release("src/x.ts", "agent-1").unwrap();
        assert!(released.success);

        let handoff = mgr.acquire("src/x.ts", "agent-2", None).unwrap();
        assert!(handoff.success);
    }

    #[test]
    fn release_without_existing_lock_is_idempotent() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let result = mgr.release("never-locked.ts", "agent-1").unwrap();
        assert!(result.success);
    }

    #[test]
    fn check_reaps_expired_lock() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.acquire("src/y.ts", "agent-1", Some(-1)).unwrap();
        assert!(mgr.check("src/y.ts").unwrap().is_none());
    }

    #[test]
    fn list_locks_filters_by_agent() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.acquire("a.ts", "agent-1", None).unwrap();
        mgr.acquire("b.ts", "agent-2", None).unwrap();

        let all = mgr.list_locks(None).unwrap();
        assert_eq!(all.len(), 2);
        let agent_1_only = mgr.list_locks(Some("agent-1")).unwrap();
        assert_eq!(agent_1_only.len(), 1);
        assert_eq!(agent_1_only[0].path, "a.ts");
    }

    #[test]
    fn release_all_for_agent_drops_only_that_agents_locks() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.acquire("a.ts", "agent-1", None).unwrap();
        mgr.acquire("b.ts", "agent-2", None).unwrap();

        let count = mgr.release_all_for_agent("agent-1").unwrap();
        assert_eq!(count, 1);
        assert!(mgr.check("a.ts").unwrap().is_none());
        assert!(mgr.check("b.ts").unwrap().is_some());
    }

    #[test]
    fn release_all_drops_every_lock_in_session() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        mgr.acquire("a.ts", "agent-1", None).unwrap();
        mgr.acquire("b.ts", "agent-2", None).unwrap();

        assert_eq!(mgr.release_all().unwrap(), 2);
        assert!(mgr.list_locks(None).unwrap().is_empty());
    }
}
