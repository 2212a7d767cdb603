use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::model::session::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Lead,
    Teammate,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Lead => "lead",
            AgentRole::Teammate => "teammate",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "lead" => AgentRole::Lead,
            "teammate" => AgentRole::Teammate,
            other => return Err(StoreError::Schema(format!("unknown agent role: {other}"))),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Active,
    Idle,
    Completed,
    Failed,
}

impl AgentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentState::Active => "active",
            AgentState::Idle => "idle",
            AgentState::Completed => "completed",
            AgentState::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        Ok(match s {
            "active" => AgentState::Active,
            "idle" => AgentState::Idle,
            "completed" => AgentState::Completed,
            "failed" => AgentState::Failed,
            other => return Err(StoreError::Schema(format!("unknown agent state: {other}"))),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub session_id: String,
    pub name: String,
    pub role: Option<AgentRole>,
    pub specialization: Option<String>,
    pub state: AgentState,
    pub spawned_at: DateTime<Utc>,
    pub boundary_config: Option<serde_json::Value>,
    pub external_session_id: Option<String>,
    pub tool_call_count: i64,
}

impl Agent {
    pub fn new(session_id: impl Into<String>, name: impl Into<String>, role: Option<AgentRole>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            session_id: session_id.into(),
            name: name.into(),
            role,
            specialization: None,
            state: AgentState::Active,
            spawned_at: Utc::now(),
            boundary_config: None,
            external_session_id: None,
            tool_call_count: 0,
        }
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let role: Option<String> = row.get("role")?;
        let state_str: String = row.get("state")?;
        let boundary_config: Option<String> = row.get("boundary_config")?;
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            name: row.get("name")?,
            role: role
                .map(|r| AgentRole::parse(&r))
                .transpose()
                .map_err(schema_err)?,
            specialization: row.get("specialization")?,
            state: AgentState::parse(&state_str).map_err(schema_err)?,
            spawned_at: parse_timestamp(row, "spawned_at")?,
            boundary_config: boundary_config.and_then(|s| serde_json::from_str(&s).ok()),
            external_session_id: row.get("external_session_id")?,
            tool_call_count: row.get("tool_call_count")?,
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("session_id", Box::new(self.session_id.clone())),
            ("name", Box::new(self.name.clone())),
            (
                "role",
                Box::new(self.role.map(|r| r.as_str().to_string())),
            ),
            ("specialization", Box::new(self.specialization.clone())),
            ("state", Box::new(self.state.as_str().to_string())),
            ("spawned_at", Box::new(format_timestamp(self.spawned_at))),
            (
                "boundary_config",
                Box::new(self.boundary_config.as_ref().map(|v| v.to_string())),
            ),
            (
                "external_session_id",
                Box::new(self.external_session_id.clone()),
            ),
            ("tool_call_count", Box::new(self.tool_call_count)),
        ]
    }
}

fn schema_err(e: StoreError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
}
