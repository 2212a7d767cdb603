/// The closed set of audit event kinds named in `spec.md` §3, plus an
/// `Other` escape hatch so an unrecognized stored value still round-trips
/// instead of failing deserialization (schema migrations may introduce
/// new event types without touching every reader at once).
///
/// Stored and read as plain strings (`as_str`/`parse`) rather than via
/// `serde`'s enum representation, since the wire shape is a single SQL
/// TEXT column, not a JSON object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    ToolUse,
    FileRead,
    FileWrite,
    FileDelete,
    SessionStart,
    SessionPause,
    SessionResume,
    SessionComplete,
    SessionFail,
    AgentSpawned,
    AgentCompleted,
    AgentFailed,
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
    GateTriggered,
    BoundaryViolation,
    LockAcquired,
    LockReleased,
    ContextSaved,
    DependencyAdded,
    DependencyRemoved,
    DependencyUpdated,
    Log,
    Other(String),
}

impl EventType {
    pub fn as_str(&self) -> std::borrow::Cow<'static, str> {
        match self {
            EventType::ToolUse => "tool_use".into(),
            EventType::FileRead => "file_read".into(),
            EventType::FileWrite => "file_write".into(),
            EventType::FileDelete => "file_delete".into(),
            EventType::SessionStart => "session_start".into(),
            EventType::SessionPause => "session_pause".into(),
            EventType::SessionResume => "session_resume".into(),
            EventType::SessionComplete => "session_complete".into(),
            EventType::SessionFail => "session_fail".into(),
            EventType::AgentSpawned => "agent_spawned".into(),
            EventType::AgentCompleted => "agent_completed".into(),
            EventType::AgentFailed => "agent_failed".into(),
            EventType::TaskCreated => "task_created".into(),
            EventType::TaskUpdated => "task_updated".into(),
            EventType::TaskCompleted => "task_completed".into(),
            EventType::GateTriggered => "gate_triggered".into(),
            EventType::BoundaryViolation => "boundary_violation".into(),
            EventType::LockAcquired => "lock_acquired".into(),
            EventType::LockReleased => "lock_released".into(),
            EventType::ContextSaved => "context_saved".into(),
            EventType::DependencyAdded => "dependency_added".into(),
            EventType::DependencyRemoved => "dependency_removed".into(),
            EventType::DependencyUpdated => "dependency_updated".into(),
            EventType::Log => "log".into(),
            EventType::Other(s) => s.clone().into(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "tool_use" => EventType::ToolUse,
            "file_read" => EventType::FileRead,
            "file_write" => EventType::FileWrite,
            "file_delete" => EventType::FileDelete,
            "session_start" => EventType::SessionStart,
            "session_pause" => EventType::SessionPause,
            "session_resume" => EventType::SessionResume,
            "session_complete" => EventType::SessionComplete,
            "session_fail" => EventType::SessionFail,
            "agent_spawned" => EventType::AgentSpawned,
            "agent_completed" => EventType::AgentCompleted,
            "agent_failed" => EventType::AgentFailed,
            "task_created" => EventType::TaskCreated,
            "task_updated" => EventType::TaskUpdated,
            "task_completed" => EventType::TaskCompleted,
            "gate_triggered" => EventType::GateTriggered,
            "boundary_violation" => EventType::BoundaryViolation,
            "lock_acquired" => EventType::LockAcquired,
            "lock_released" => EventType::LockReleased,
            "context_saved" => EventType::ContextSaved,
            "dependency_added" => EventType::DependencyAdded,
            "dependency_removed" => EventType::DependencyRemoved,
            "dependency_updated" => EventType::DependencyUpdated,
            "log" => EventType::Log,
            other => EventType::Other(other.to_string()),
        }
    }

    /// The user-facing display mapping named in `spec.md` §6: the stored
    /// value is unchanged, only report/export consumers show this name.
    pub fn display_name(&self) -> std::borrow::Cow<'static, str> {
        match self {
            EventType::GateTriggered => "sensitive_needs_review".into(),
            other => other.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "warning" => Severity::Warning,
            "critical" => Severity::Critical,
            _ => Severity::Info,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_triggered_displays_as_sensitive_needs_review() {
        assert_eq!(
            EventType::GateTriggered.display_name(),
            "sensitive_needs_review"
        );
        assert_eq!(EventType::GateTriggered.as_str(), "gate_triggered");
    }

    #[test]
    fn unknown_event_type_round_trips_via_other() {
        let parsed = EventType::parse("something_new");
        assert_eq!(parsed, EventType::Other("something_new".to_string()));
        assert_eq!(parsed.as_str(), "something_new");
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Critical);
    }
}
