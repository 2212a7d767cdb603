use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::model::session::{format_timestamp, parse_timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    ForbiddenPath,
    OutsideAllowed,
}

impl ViolationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationType::ForbiddenPath => "forbidden_path",
            ViolationType::OutsideAllowed => "outside_allowed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "outside_allowed" => ViolationType::OutsideAllowed,
            _ => ViolationType::ForbiddenPath,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementAction {
    Logged,
    Blocked,
    Reverted,
    RevertFailed,
}

impl EnforcementAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnforcementAction::Logged => "logged",
            EnforcementAction::Blocked => "blocked",
            EnforcementAction::Reverted => "reverted",
            EnforcementAction::RevertFailed => "revert_failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "blocked" => EnforcementAction::Blocked,
            "reverted" => EnforcementAction::Reverted,
            "revert_failed" => EnforcementAction::RevertFailed,
            _ => EnforcementAction::Logged,
        }
    }
}

/// Record of a denied or reverted access (`spec.md` §3). Append-only,
/// like [`crate::model::audit_event::AuditEvent`] — no setters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryViolation {
    pub id: String,
    pub session_id: String,
    pub agent_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub file_path: String,
    pub violation_type: ViolationType,
    pub enforcement_action: EnforcementAction,
    pub details: Option<serde_json::Value>,
}

impl BoundaryViolation {
    pub fn new(
        session_id: impl Into<String>,
        file_path: impl Into<String>,
        violation_type: ViolationType,
        enforcement_action: EnforcementAction,
    ) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            session_id: session_id.into(),
            agent_id: None,
            timestamp: Utc::now(),
            file_path: file_path.into(),
            violation_type,
            enforcement_action,
            details: None,
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let violation_type: String = row.get("violation_type")?;
        let enforcement_action: String = row.get("enforcement_action")?;
        let details: Option<String> = row.get("details")?;
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            agent_id: row.get("agent_id")?,
            timestamp: parse_timestamp(row, "timestamp")?,
            file_path: row.get("file_path")?,
            violation_type: ViolationType::parse(&violation_type),
            enforcement_action: EnforcementAction::parse(&enforcement_action),
            details: details.and_then(|s| serde_json::from_str(&s).ok()),
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("session_id", Box::new(self.session_id.clone())),
            ("agent_id", Box::new(self.agent_id.clone())),
            ("timestamp", Box::new(format_timestamp(self.timestamp))),
            ("file_path", Box::new(self.file_path.clone())),
            (
                "violation_type",
                Box::new(self.violation_type.as_str().to_string()),
            ),
            (
                "enforcement_action",
                Box::new(self.enforcement_action.as_str().to_string()),
            ),
            (
                "details",
                Box::new(self.details.as_ref().map(|v| v.to_string())),
            ),
        ]
    }
}
