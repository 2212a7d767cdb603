//! Request/query shapes for [`crate::logger::AuditLogger`], mirroring
//! the teacher's `AuditEvent` builder idiom
//! (`ta_audit::event::AuditEvent::with_target`, etc.) one level up, at
//! the call-site rather than the stored-record level.

use chrono::{DateTime, Utc};
use khoregos_store::model::{EventType, Severity};

#[derive(Debug, Clone)]
pub struct LogRequest {
    pub event_type: EventType,
    pub action: String,
    pub agent_id: Option<String>,
    pub details: Option<serde_json::Value>,
    pub files: Vec<String>,
    pub gate_id: Option<String>,
    pub severity: Option<Severity>,
}

impl LogRequest {
    pub fn new(event_type: EventType, action: impl Into<String>) -> Self {
        Self {
            event_type,
            action: action.into(),
            agent_id: None,
            details: None,
            files: Vec::new(),
            gate_id: None,
            severity: None,
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
        self.files = files;
        self
    }

    pub fn with_gate(mut self, gate_id: impl Into<String>) -> Self {
        self.gate_id = Some(gate_id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }
}

/// Filters for [`crate::logger::AuditLogger::get_events`]. All fields
/// default to "no filter."
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub event_type: Option<String>,
    pub agent_id: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub severity: Option<Severity>,
    pub trace_id: Option<String>,
}
