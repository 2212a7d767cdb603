use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::model::event_type::{EventType, Severity};
use crate::model::session::{format_timestamp, parse_timestamp};

/// `DateTime<Utc>`'s derived `Serialize` calls `to_rfc3339()`
/// (`SecondsFormat::AutoSi`), which drops trailing zero sub-second
/// digits — a timestamp landing on a whole millisecond serializes with
/// no fractional part at all. `spec.md` §3 fixes millisecond precision
/// everywhere a timestamp is emitted, including into the HMAC chain's
/// canonical form, so this field forces `SecondsFormat::Millis`
/// explicitly rather than relying on the derive.
mod rfc3339_millis {
    use super::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse::<DateTime<Utc>>().map_err(serde::de::Error::custom)
    }
}

/// The durable, append-only audit record (`spec.md` §3). Only
/// constructors and builder methods are exposed — no setters — mirroring
/// the teacher's `AuditEvent` builder idiom: a record is assembled once
/// by `AuditLogger::log` and never mutated after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: String,
    pub session_id: String,
    pub sequence: i64,
    #[serde(with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
    pub agent_id: Option<String>,
    pub event_type: String,
    pub action: String,
    pub details: Option<serde_json::Value>,
    pub files_affected: Option<Vec<String>>,
    pub gate_id: Option<String>,
    pub hmac: Option<String>,
    pub severity: String,
}

impl AuditEvent {
    pub fn new(session_id: impl Into<String>, sequence: i64, event_type: EventType, action: impl Into<String>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            session_id: session_id.into(),
            sequence,
            timestamp: Utc::now(),
            agent_id: None,
            event_type: event_type.as_str().into_owned(),
            action: action.into(),
            details: None,
            files_affected: None,
            gate_id: None,
            hmac: None,
            severity: Severity::Info.as_str().to_string(),
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

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        if !files.is_empty() {
            self.files_affected = Some(files);
        }
        self
    }

    pub fn with_gate(mut self, gate_id: impl Into<String>) -> Self {
        self.gate_id = Some(gate_id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity.as_str().to_string();
        self
    }

    pub fn with_hmac(mut self, hmac: impl Into<String>) -> Self {
        self.hmac = Some(hmac.into());
        self
    }

    pub fn severity(&self) -> Severity {
        Severity::parse(&self.severity)
    }

    pub fn event_type(&self) -> EventType {
        EventType::parse(&self.event_type)
    }

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let details: Option<String> = row.get("details")?;
        let files_affected: Option<String> = row.get("files_affected")?;
        Ok(Self {
            id: row.get("id")?,
            session_id: row.get("session_id")?,
            sequence: row.get("sequence")?,
            timestamp: parse_timestamp(row, "timestamp")?,
            agent_id: row.get("agent_id")?,
            event_type: row.get("event_type")?,
            action: row.get("action")?,
            details: details.and_then(|s| serde_json::from_str(&s).ok()),
            files_affected: files_affected.and_then(|s| serde_json::from_str(&s).ok()),
            gate_id: row.get("gate_id")?,
            hmac: row.get("hmac")?,
            severity: row.get("severity")?,
        })
    }

    pub fn to_columns(&self) -> Vec<(&'static str, Box<dyn rusqlite::ToSql>)> {
        vec![
            ("id", Box::new(self.id.clone())),
            ("sequence", Box::new(self.sequence)),
            ("session_id", Box::new(self.session_id.clone())),
            ("agent_id", Box::new(self.agent_id.clone())),
            ("timestamp", Box::new(format_timestamp(self.timestamp))),
            ("event_type", Box::new(self.event_type.clone())),
            ("action", Box::new(self.action.clone())),
            (
                "details",
                Box::new(self.details.as_ref().map(|v| v.to_string())),
            ),
            (
                "files_affected",
                Box::new(
                    self.files_affected
                        .as_ref()
                        .map(|v| serde_json::to_string(v).unwrap_or_default()),
                ),
            ),
            ("gate_id", Box::new(self.gate_id.clone())),
            ("hmac", Box::new(self.hmac.clone())),
            ("severity", Box::new(self.severity.clone())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain_sets_expected_fields() {
        let event = AuditEvent::new("sess-1", 1, EventType::ToolUse, "Write")
            .with_agent("agent-1")
            .with_files(vec!["src/main.rs".to_string()])
            .with_severity(Severity::Warning);
        assert_eq!(event.agent_id.as_deref(), Some("agent-1"));
        assert_eq!(event.severity(), Severity::Warning);
        assert_eq!(event.files_affected.unwrap().len(), 1);
    }

    #[test]
    fn empty_files_list_stays_none() {
        let event = AuditEvent::new("sess-1", 1, EventType::ToolUse, "Write").with_files(vec![]);
        assert!(event.files_affected.is_none());
    }
}
