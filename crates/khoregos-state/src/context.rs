//! Per-session key/value scratch storage. `(session_id, key)` is the
//! primary key; writes are upserts (`spec.md` §3, §4.4).

use khoregos_store::model::ContextEntry;

use crate::manager::StateManager;
use crate::Result;

impl StateManager {
    pub fn save_context(&self, entry: ContextEntry) -> Result<()> {
        let columns = entry.to_columns();
        let col_refs: Vec<(&str, &dyn rusqlite::ToSql)> =
            columns.iter().map(|(c, v)| (*c, v.as_ref())).collect();
        self.store.insert_or_replace("context_store", &col_refs)?;
        Ok(())
    }

    pub fn load_context(&self, session_id: &str, key: &str) -> Result<Option<ContextEntry>> {
        Ok(self.store.fetch_one(
            "SELECT * FROM context_store WHERE session_id = ?1 AND key = ?2",
            &[&session_id, &key],
            ContextEntry::from_row,
        )?)
    }

    /// All context entries for a session, optionally narrowed to one
    /// agent, most recently updated first.
    pub fn load_all_context(&self, session_id: &str, agent_id: Option<&str>) -> Result<Vec<ContextEntry>> {
        match agent_id {
            Some(agent_id) => Ok(self.store.fetch_all(
                "SELECT * FROM context_store WHERE session_id = ?1 AND agent_id = ?2 ORDER BY updated_at DESC",
                &[&session_id, &agent_id],
                ContextEntry::from_row,
            )?),
            None => Ok(self.store.fetch_all(
                "SELECT * FROM context_store WHERE session_id = ?1 ORDER BY updated_at DESC",
                &[&session_id],
                ContextEntry::from_row,
            )?),
        }
    }

    pub fn delete_context(&self, session_id: &str, key: &str) -> Result<()> {
        self.store
            .delete("context_store", "session_id = ?1 AND key = ?2", &[&session_id, &key])?;
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
    fn save_context_upserts_on_session_and_key() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();

        mgr.save_context(ContextEntry::new("plan", &session.id, None, Some("v1".into())))
            .unwrap();
        mgr.save_context(ContextEntry::new("plan", &session.id, None, Some("v2".into())))
            .unwrap();

        let entries = mgr.load_all_context(&session.id, None).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value.as_deref(), Some("v2"));
    }

    #[test]
    fn load_all_context_filters_by_agent() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();

        mgr.save_context(ContextEntry::new("a", &session.id, Some("agent-1".into()), None))
            .unwrap();
        mgr.save_context(ContextEntry::new("b", &session.id, Some("agent-2".into()), None))
            .unwrap();

        let for_agent_1 = mgr.load_all_context(&session.id, Some("agent-1")).unwrap();
        assert_eq!(for_agent_1.len(), 1);
        assert_eq!(for_agent_1[0].key, "a");
    }

    #[test]
    fn delete_context_removes_entry() {
        let dir = tempdir().unwrap();
        let mgr = manager(dir.path());
        let session = mgr.create_session(None, None, None).unwrap();
        mgr.save_context(ContextEntry::new("k", &session.id, None, Some("v".into())))
            .unwrap();
        mgr.delete_context(&session.id, "k").unwrap();
        assert!(mgr.load_context(&session.id, "k").unwrap().is_none());
    }
}
