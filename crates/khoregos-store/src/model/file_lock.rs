use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::model::session::{format_timestamp, parse_optional_timestamp, parse_timestamp};

/// Exclusive ownership of a path within a session (`spec.md` §3). `path`
/// is the primary key — at most one live lock per path. A lock is live
/// iff `expires_at` is null or in the future; liveness is evaluated by
/// the lock manager, not stored as a separate flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileLock {
    pub path: String,
    pub session_id: String,
    pub agent_id: String,
    pub acquired_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileLock {
    pub fn new(
        path: impl Into<String>,
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        duration_seconds: i64,
    ) -> Self {
        let acquired_at = Utc::now();
        Self {
            path: path.into(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            acquired_at,
            expires_at: Some(acquired_at + chrono::Duration::seconds(duration_seconds)),
        }
    }

    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            None => true,
            Some(expires_at) => expires_at > now,
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            path: row.get("path")?,
            session_id: row.get("session_id")?,
            agent_id: row.get("agent_id")?,
            acquired_at: parse_timestamp(row, "acquired_at")?,
            expires_at: parse_optional_timestamp(row, "expires_at")?,
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("path", Box::new(self.path.clone())),
            ("session_id", Box::new(self.session_id.clone())),
            ("agent_id", Box::new(self.agent_id.clone())),
            ("acquired_at", Box::new(format_timestamp(self.acquired_at))),
            (
                "expires_at",
                Box::new(self.expires_at.map(format_timestamp)),
            ),
        ]
    }
}
