//! Session lifecycle: creation, state transitions, and lookup
//! (`spec.md` §4.4).

use chrono::Utc;
use khoregos_store::model::{Session, SessionState};

use crate::error::{Result, StateError};
use crate::manager::StateManager;

/// Filters for [`StateManager::list_sessions`]. All fields default to
/// "no filter."
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub state: Option<SessionState>,
}

impl StateManager {
    /// Create a new session in state `created`. `objective` and
    /// `config_snapshot` are optional free-form fields; `parent` links a
    /// subagent-spawned session back to its parent, if any.
    pub fn create_session(
        &self,
        objective: Option<String>,
        config_snapshot: Option<serde_json::Value>,
        parent: Option<String>,
    ) -> Result<Session> {
        let mut session = Session::new(objective, parent);
        session.config_snapshot = config_snapshot;

        let columns = session.to_columns();
        let col_refs: Vec<(&str, &dyn rusqlite::ToSql)> =
            columns.iter().map(|(c, v)| (*c, v.as_ref())).collect();
        self.store.insert("sessions", &col_refs)?;
        Ok(session)
    }

    pub fn mark_active(&self, session_id: &str) -> Result<()> {
        self.set_state(session_id, SessionState::Active)
    }

    pub fn mark_paused(&self, session_id: &str) -> Result<()> {
        self.set_state(session_id, SessionState::Paused)
    }

    /// Mark a session `completed`, setting `ended_at` to now and, if
    /// given, recording a closing `context_summary`.
    pub fn mark_completed(&self, session_id: &str, summary: Option<String>) -> Result<()> {
        let ended_at = Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
        let state = SessionState::Completed.as_str().to_string();
        let rows = self.store.update(
            "sessions",
            &[
                ("state", &state),
                ("ended_at", &ended_at),
                ("context_summary", &summary),
            ],
            "id = ?1",
            &[&session_id],
        )?;
        if rows == 0 {
            return Err(StateError::UnknownSession(session_id.to_string()));
        }
        Ok(())
    }

    fn set_state(&self, session_id: &str, state: SessionState) -> Result<()> {
        let state_str = state.as_str().to_string();
        let rows = self
            .store
            .update("sessions", &[("state", &state_str)], "id = ?1", &[&session_id])?;
        if rows == 0 {
            return Err(StateError::UnknownSession(session_id.to_string()));
        }
        Ok(())
    }

    pub fn get_session(&self, id: &str) -> Result<Option<Session>> {
        Ok(self
            .store
            .fetch_one("SELECT * FROM sessions WHERE id = ?1", &[&id], Session::from_row)?)
    }

    /// The most recently started session, regardless of state.
    pub fn get_latest_session(&self) -> Result<Option<Session>> {
        Ok(self.store.fetch_one(
            "SELECT * FROM sessions ORDER BY started_at DESC LIMIT 1",
            &[],
            Session::from_row,
        )?)
    }

    /// The first session with state `created` or `active`, most recently
    /// started first (`spec.md` §4.4).
    pub fn get_active_session(&self) -> Result<Option<Session>> {
        Ok(self.store.fetch_one(
            "SELECT * FROM sessions WHERE state IN ('created', 'active') ORDER BY started_at DESC LIMIT 1",
            &[],
            Session::from_row,
        )?)
    }

    pub fn list_sessions(&self, query: SessionQuery) -> Result<Vec<Session>> {
        let mut where_clauses = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(state) = &query.state {
            params.push(Box::new(state.as_str().to_string()));
            where_clauses.push(format!("state = ?{}", params.len()));
        }

        let mut sql = "SELECT * FROM sessions".to_string();
        if !where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&where_clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY started_at DESC");
        if let Some(limit) = query.limit {
            params.push(Box::new(limit));
            sql.push_str(&format!(" LIMIT ?{}", params.len()));
        }
        if let Some(offset) = query.offset {
            params.push(Box::new(offset));
            sql.push_str(&format!(" OFFSET ?{}", params.len()));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        Ok(self.store.fetch_all(&sql, &param_refs, Session::from_row)?)
    }

    /// Overwrite every mutable column of a session with `session`'s
    /// current field values.
    pub fn update_session(&self, session: &Session) -> Result<()> {
        let columns = session.to_columns();
        let set: Vec<(&str, &dyn rusqlite::ToSql)> = columns
            .iter()
            .filter(|(c, _)| *c != "id")
            .map(|(c, v)| (*c, v.as_ref()))
            .collect();
        let rows = self
            .store
            .update("sessions", &set, "id = ?1", &[&session.id])?;
        if rows == 0 {
            return Err(StateError::UnknownSession(session.id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use khoregos_store::Store;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn manager(dir: &std::path::Path) -> StateManager {
        let store = Arc::new(Store::new(dir));
        store.connect().unwrap();
        StateManager::new(store)
    }

    #[test]
    fn create_session_starts_created() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(Some("ship it".into()), None, None).unwrap();
        assert_eq!(session.state, SessionState::Created);
        let fetched = mgr.get_session(&session.id).unwrap().unwrap();
        assert_eq!(fetched.objective.as_deref(), Some("ship it"));
    }

    #[test]
    fn mark_completed_sets_ended_at() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        mgr.mark_completed(&session.id, Some("done".into())).unwrap();
        let fetched = mgr.get_session(&session.id).unwrap().unwrap();
        assert_eq!(fetched.state, SessionState::Completed);
        assert!(fetched.ended_at.is_some());
        assert_eq!(fetched.context_summary.as_deref(), Some("done"));
    }

    #[test]
    fn mark_active_on_unknown_session_errors() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let err = mgr.mark_active("nope").unwrap_err();
        assert!(matches!(err, StateError::UnknownSession(_)));
    }

    #[test]
    fn get_active_session_prefers_most_recent() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let first = mgr.create_session(Some("first".into()), None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = mgr.create_session(Some("second".into()), None, None).unwrap();
        mgr.mark_completed(&first.id, None).unwrap();

        let active = mgr.get_active_session().unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[test]
    fn list_sessions_filters_by_state() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let a = mgr.create_session(None, None, None).unwrap();
        let b = mgr.create_session(None, None, None).unwrap();
        mgr.mark_completed(&a.id, None).unwrap();

        let completed = mgr
            .list_sessions(SessionQuery {
                state: Some(SessionState::Completed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, a.id);

        let created = mgr
            .list_sessions(SessionQuery {
                state: Some(SessionState::Created),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].id, b.id);
    }
}
