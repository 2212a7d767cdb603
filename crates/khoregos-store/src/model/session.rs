use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};

/// Lifecycle state of a [`Session`]. `ended_at` is null iff the state is
/// not `Completed`/`Failed` (`spec.md` §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Created,
    Active,
    Paused,
    Completed,
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Created => "created",
            SessionState::Active => "active",
            SessionState::Paused => "paused",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "created" => SessionState::Created,
            "active" => SessionState::Active,
            "paused" => SessionState::Paused,
            "completed" => SessionState::Completed,
            "failed" => SessionState::Failed,
            other => {
                return Err(StoreError::Schema(format!(
                    "unknown session state: {other}"
                )))
            }
        })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Failed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub objective: Option<String>,
    pub state: SessionState,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub parent_session_id: Option<String>,
    pub config_snapshot: Option<serde_json::Value>,
    pub context_summary: Option<String>,
    pub operator: Option<String>,
    pub hostname: Option<String>,
    pub k6s_version: Option<String>,
    pub agent_runtime_version: Option<String>,
    pub git_branch: Option<String>,
    pub git_sha: Option<String>,
    pub git_dirty: bool,
    pub trace_id: Option<String>,
}

impl Session {
    pub fn new(objective: Option<String>, parent_session_id: Option<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            objective,
            state: SessionState::Created,
            started_at: Utc::now(),
            ended_at: None,
            parent_session_id,
            config_snapshot: None,
            context_summary: None,
            operator: None,
            hostname: None,
            k6s_version: None,
            agent_runtime_version: None,
            git_branch: None,
            git_sha: None,
            git_dirty: false,
            trace_id: Some(Uuid::new_v4().to_string()),
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let state_str: String = row.get("state")?;
        let config_snapshot: Option<String> = row.get("config_snapshot")?;
        Ok(Self {
            id: row.get("id")?,
            objective: row.get("objective")?,
            state: SessionState::parse(&state_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
            started_at: parse_timestamp(row, "started_at")?,
            ended_at: parse_optional_timestamp(row, "ended_at")?,
            parent_session_id: row.get("parent_session_id")?,
            config_snapshot: config_snapshot
                .and_then(|s| serde_json::from_str(&s).ok()),
            context_summary: row.get("context_summary")?,
            operator: row.get("operator")?,
            hostname: row.get("hostname")?,
            k6s_version: row.get("k6s_version")?,
            agent_runtime_version: row.get("agent_runtime_version")?,
            git_branch: row.get("git_branch")?,
            git_sha: row.get("git_sha")?,
            git_dirty: row.get::<_, i64>("git_dirty")? != 0,
            trace_id: row.get("trace_id")?,
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("objective", Box::new(self.objective.clone())),
            ("state", Box::new(self.state.as_str().to_string())),
            ("started_at", Box::new(format_timestamp(self.started_at))),
            (
                "ended_at",
                Box::new(self.ended_at.map(format_timestamp)),
            ),
            (
                "parent_session_id",
                Box::new(self.parent_session_id.clone()),
            ),
            (
                "config_snapshot",
                Box::new(
                    self.config_snapshot
                        .as_ref()
                        .map(|v| v.to_string()),
                ),
            ),
            ("context_summary", Box::new(self.context_summary.clone())),
            ("operator", Box::new(self.operator.clone())),
            ("hostname", Box::new(self.hostname.clone())),
            ("k6s_version", Box::new(self.k6s_version.clone())),
            (
                "agent_runtime_version",
                Box::new(self.agent_runtime_version.clone()),
            ),
            ("git_branch", Box::new(self.git_branch.clone())),
            ("git_sha", Box::new(self.git_sha.clone())),
            ("git_dirty", Box::new(self.git_dirty as i64)),
            ("trace_id", Box::new(self.trace_id.clone())),
        ]
    }
}

pub(crate) fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(column)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_optional_timestamp(
    row: &Row<'_>,
    column: &str,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        None => Ok(None),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_starts_created_with_no_end() {
        let s = Session::new(Some("objective".into()), None);
        assert_eq!(s.state, SessionState::Created);
        assert!(s.ended_at.is_none());
        assert!(s.trace_id.is_some());
    }

    #[test]
    fn state_round_trips_through_str() {
        for state in [
            SessionState::Created,
            SessionState::Active,
            SessionState::Paused,
            SessionState::Completed,
            SessionState::Failed,
        ] {
            assert_eq!(SessionState::parse(state.as_str()).unwrap(), state);
        }
    }
}
