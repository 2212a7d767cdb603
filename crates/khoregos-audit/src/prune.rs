//! Retention-driven deletion of old audit events and the sessions they
//! leave empty (`spec.md` §4.3 "prune"). The only place audit rows are
//! ever deleted rather than appended.

use khoregos_store::Store;

use crate::error::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub events_deleted: i64,
    pub sessions_pruned: i64,
}

/// Delete audit events older than `before_date`, then cascade-delete any
/// session that is both terminal and now empty of events. `dry_run`
/// reports the counts a real run would produce without mutating
/// anything — the whole operation, counts included, happens inside one
/// transaction so a dry run and a real run agree on what they saw.
pub fn prune(store: &Store, before_date: &str, dry_run: bool) -> Result<PruneResult> {
    store.connect()?;
    let result = store.transaction(|conn| {
        let events_deleted: i64 = conn.query_row(
            "SELECT COUNT(*) FROM audit_events WHERE timestamp < ?1",
            rusqlite::params![before_date],
            |row| row.get(0),
        )?;

        let prunable_sessions: Vec<String> = {
            let mut stmt = conn.prepare(
                "SELECT s.id FROM sessions s
                 WHERE s.state IN ('completed', 'failed')
                   AND s.ended_at IS NOT NULL
                   AND s.ended_at < ?1
                   AND NOT EXISTS (
                       SELECT 1 FROM audit_events e
                       WHERE e.session_id = s.id AND e.timestamp >= ?1
                   )",
            )?;
            let rows = stmt.query_map(rusqlite::params![before_date], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<Vec<String>>>()?
        };
        let sessions_pruned = prunable_sessions.len() as i64;

        if dry_run {
            return Ok(PruneResult {
                events_deleted,
                sessions_pruned,
            });
        }

        conn.execute(
            "DELETE FROM audit_events WHERE timestamp < ?1",
            rusqlite::params![before_date],
        )?;

        for session_id in &prunable_sessions {
            conn.execute(
                "DELETE FROM boundary_violations WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?;
            conn.execute(
                "DELETE FROM file_locks WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?;
            conn.execute(
                "DELETE FROM context_store WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?;
            conn.execute(
                "DELETE FROM agents WHERE session_id = ?1",
                rusqlite::params![session_id],
            )?;
            conn.execute(
                "DELETE FROM sessions WHERE id = ?1",
                rusqlite::params![session_id],
            )?;
        }

        Ok(PruneResult {
            events_deleted,
            sessions_pruned,
        })
    })?;

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use khoregos_store::model::EventType;
    use tempfile::tempdir;

    use crate::logger::AuditLogger;
    use crate::request::LogRequest;
    use std::sync::Arc;

    fn seed_session(store: &Store, id: &str, state: &str, ended_at: Option<&str>) {
        store
            .insert(
                "sessions",
                &[
                    ("id", &id),
                    ("state", &state),
                    ("started_at", &"2020-01-01T00:00:00.000Z"),
                    ("ended_at", &ended_at),
                    ("git_dirty", &0i64),
                ],
            )
            .unwrap();
    }

    #[test]
    fn dry_run_reports_without_deleting() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        seed_session(&store, "sess-old", "completed", Some("2020-01-02T00:00:00.000Z"));

        let logger = AuditLogger::start(store.clone(), "sess-old", None, None).unwrap();
        logger.log(LogRequest::new(EventType::SessionStart, "start")).unwrap();

        let result = prune(&store, "2025-01-01T00:00:00.000Z", true).unwrap();
        assert_eq!(result.events_deleted, 1);
        assert_eq!(result.sessions_pruned, 1);

        let remaining: i64 = store
            .fetch_one("SELECT COUNT(*) FROM sessions", &[], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(remaining, 1);
    }

    #[test]
    fn real_run_cascades_to_terminal_empty_sessions() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        seed_session(&store, "sess-old", "completed", Some("2020-01-02T00:00:00.000Z"));

        let logger = AuditLogger::start(store.clone(), "sess-old", None, None).unwrap();
        logger.log(LogRequest::new(EventType::SessionStart, "start")).unwrap();

        let result = prune(&store, "2025-01-01T00:00:00.000Z", false).unwrap();
        assert_eq!(result.events_deleted, 1);
        assert_eq!(result.sessions_pruned, 1);

        let remaining: i64 = store
            .fetch_one("SELECT COUNT(*) FROM sessions", &[], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(remaining, 0);
    }

    #[test]
    fn active_sessions_are_never_pruned_even_if_old() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        store.connect().unwrap();
        seed_session(&store, "sess-active", "active", None);

        let result = prune(&store, "2025-01-01T00:00:00.000Z", false).unwrap();
        assert_eq!(result.sessions_pruned, 0);

        let remaining: i64 = store
            .fetch_one("SELECT COUNT(*) FROM sessions", &[], |row| row.get(0))
            .unwrap()
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
