use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::model::session::{format_timestamp, parse_timestamp};

/// Keyed persistent scratch value per session. `(key, session_id)` is
/// the primary key; writes are upserts (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextEntry {
    pub key: String,
    pub session_id: String,
    pub agent_id: Option<String>,
    pub value: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl ContextEntry {
    pub fn new(
        key: impl Into<String>,
        session_id: impl Into<String>,
        agent_id: Option<String>,
        value: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            session_id: session_id.into(),
            agent_id,
            value,
            updated_at: Utc::now(),
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            key: row.get("key")?,
            session_id: row.get("session_id")?,
            agent_id: row.get("agent_id")?,
            value: row.get("value")?,
            updated_at: parse_timestamp(row, "updated_at")?,
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("key", Box::new(self.key.clone())),
            ("session_id", Box::new(self.session_id.clone())),
            ("agent_id", Box::new(self.agent_id.clone())),
            ("value", Box::new(self.value.clone())),
            ("updated_at", Box::new(format_timestamp(self.updated_at))),
        ]
    }
}
