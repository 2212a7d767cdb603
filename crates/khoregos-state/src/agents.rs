//! Agent registration, lookup, and resource-counter bookkeeping
//! (`spec.md` §4.4).

use khoregos_store::model::{Agent, AgentRole};
use rusqlite::OptionalExtension;

use crate::manager::StateManager;
use crate::Result;

impl StateManager {
    /// Register a new agent under `session_id`. `tool_call_count` starts
    /// at zero.
    pub fn register_agent(
        &self,
        session_id: &str,
        name: &str,
        role: Option<AgentRole>,
        specialization: Option<String>,
        boundary_config: Option<serde_json::Value>,
    ) -> Result<Agent> {
        let mut agent = Agent::new(session_id, name, role);
        agent.specialization = specialization;
        agent.boundary_config = boundary_config;

        let columns = agent.to_columns();
        let col_refs: Vec<(&str, &dyn rusqlite::ToSql)> =
            columns.iter().map(|(c, v)| (*c, v.as_ref())).collect();
        self.store.insert("agents", &col_refs)?;
        Ok(agent)
    }

    /// Lookup by `(session_id, name)`. Multiple agents may share a name
    /// within a session (`spec.md` §3, §9 open question); the first match
    /// ordered by `spawned_at` ascending wins.
    pub fn get_agent_by_name(&self, session_id: &str, name: &str) -> Result<Option<Agent>> {
        Ok(self.store.fetch_one(
            "SELECT * FROM agents WHERE session_id = ?1 AND name = ?2 ORDER BY spawned_at ASC LIMIT 1",
            &[&session_id, &name],
            Agent::from_row,
        )?)
    }

    pub fn get_agent_by_external_session_id(&self, external_session_id: &str) -> Result<Option<Agent>> {
        Ok(self.store.fetch_one(
            "SELECT * FROM agents WHERE external_session_id = ?1 LIMIT 1",
            &[&external_session_id],
            Agent::from_row,
        )?)
    }

    /// Assign `external_session_id` to the most recently spawned agent in
    /// `session_id` that has no external session id yet. Returns `None`
    /// if every agent in the session is already assigned.
    pub fn assign_external_session_to_newest_unassigned(
        &self,
        session_id: &str,
        external_session_id: &str,
    ) -> Result<Option<Agent>> {
        let session_id = session_id.to_string();
        let external_session_id = external_session_id.to_string();
        Ok(self.store.transaction(move |conn| {
            let candidate: Option<String> = conn
                .query_row(
                    "SELECT id FROM agents WHERE session_id = ?1 AND external_session_id IS NULL \
                     ORDER BY spawned_at DESC LIMIT 1",
                    rusqlite::params![session_id],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(agent_id) = candidate else {
                return Ok(None);
            };
            conn.execute(
                "UPDATE agents SET external_session_id = ?1 WHERE id = ?2",
                rusqlite::params![external_session_id, agent_id],
            )?;
            let agent = conn.query_row("SELECT * FROM agents WHERE id = ?1", rusqlite::params![agent_id], Agent::from_row)?;
            Ok(Some(agent))
        })?)
    }

    /// Atomically increment `tool_call_count` and return the resulting
    /// count (`spec.md` §4.4, §4.7).
    pub fn increment_tool_call_count(&self, agent_id: &str) -> Result<i64> {
        let agent_id = agent_id.to_string();
        Ok(self.store.transaction(move |conn| {
            conn.execute(
                "UPDATE agents SET tool_call_count = tool_call_count + 1 WHERE id = ?1",
                rusqlite::params![agent_id],
            )?;
            let new_count: i64 = conn.query_row(
                "SELECT tool_call_count FROM agents WHERE id = ?1",
                rusqlite::params![agent_id],
                |row| row.get(0),
            )?;
            Ok(new_count)
        })?)
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
    fn register_agent_starts_at_zero_calls() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        let agent = mgr
            .register_agent(&session.id, "primary", Some(AgentRole::Lead), None, None)
            .unwrap();
        assert_eq!(agent.tool_call_count, 0);
    }

    #[test]
    fn get_agent_by_name_returns_first_spawned() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        let first = mgr.register_agent(&session.id, "reviewer", None, None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        mgr.register_agent(&session.id, "reviewer", None, None, None).unwrap();

        let found = mgr.get_agent_by_name(&session.id, "reviewer").unwrap().unwrap();
        assert_eq!(found.id, first.id);
    }

    #[test]
    fn assign_external_session_picks_newest_unassigned() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        mgr.register_agent(&session.id, "lead", None, None, None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let newest = mgr.register_agent(&session.id, "teammate", None, None, None).unwrap();

        let assigned = mgr
            .assign_external_session_to_newest_unassigned(&session.id, "ext-1")
            .unwrap()
            .unwrap();
        assert_eq!(assigned.id, newest.id);
        assert_eq!(assigned.external_session_id.as_deref(), Some("ext-1"));

        let lookup = mgr.get_agent_by_external_session_id("ext-1").unwrap().unwrap();
        assert_eq!(lookup.id, newest.id);
    }

    #[test]
    fn assign_external_session_returns_none_when_all_assigned() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        let agent = mgr.register_agent(&session.id, "lead", None, None, None).unwrap();
        mgr.assign_external_session_to_newest_unassigned(&session.id, "ext-1")
            .unwrap();
        let _ = agent;

        let result = mgr
            .assign_external_session_to_newest_unassigned(&session.id, "ext-2")
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn increment_tool_call_count_is_monotone() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        let agent = mgr.register_agent(&session.id, "primary", None, None, None).unwrap();

        assert_eq!(mgr.increment_tool_call_count(&agent.id).unwrap(), 1);
        assert_eq!(mgr.increment_tool_call_count(&agent.id).unwrap(), 2);
    }
}
