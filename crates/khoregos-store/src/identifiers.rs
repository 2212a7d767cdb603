//! The compiled table/column allow-list. Every dynamic identifier that
//! reaches `insert`/`insert_or_replace`/`update` is checked here before
//! any SQL string is built, satisfying the identifier-safety invariant:
//! an unknown table or column fails before a query is ever constructed.

use crate::error::{Result, StoreError};

const SESSIONS: &[&str] = &[
    "id",
    "objective",
    "state",
    "started_at",
    "ended_at",
    "parent_session_id",
    "config_snapshot",
    "context_summary",
    "metadata",
    "operator",
    "hostname",
    "k6s_version",
    "agent_runtime_version",
    "git_branch",
    "git_sha",
    "git_dirty",
    "trace_id",
];

const AGENTS: &[&str] = &[
    "id",
    "session_id",
    "name",
    "role",
    "specialization",
    "state",
    "spawned_at",
    "boundary_config",
    "metadata",
    "external_session_id",
    "tool_call_count",
];

const AUDIT_EVENTS: &[&str] = &[
    "id",
    "sequence",
    "session_id",
    "agent_id",
    "timestamp",
    "event_type",
    "action",
    "details",
    "files_affected",
    "gate_id",
    "hmac",
    "severity",
];

const CONTEXT_STORE: &[&str] = &["key", "session_id", "agent_id", "value", "updated_at"];

const FILE_LOCKS: &[&str] = &["path", "session_id", "agent_id", "acquired_at", "expires_at"];

const BOUNDARY_VIOLATIONS: &[&str] = &[
    "id",
    "session_id",
    "agent_id",
    "timestamp",
    "file_path",
    "violation_type",
    "enforcement_action",
    "details",
];

const SCHEMA_MIGRATIONS: &[&str] = &["version", "applied_at"];

const TABLES: &[(&str, &[&str])] = &[
    ("sessions", SESSIONS),
    ("agents", AGENTS),
    ("audit_events", AUDIT_EVENTS),
    ("context_store", CONTEXT_STORE),
    ("file_locks", FILE_LOCKS),
    ("boundary_violations", BOUNDARY_VIOLATIONS),
    ("schema_migrations", SCHEMA_MIGRATIONS),
];

fn is_safe_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub fn validate_table(table: &str) -> Result<&'static [&'static str]> {
    if !is_safe_identifier(table) {
        return Err(StoreError::UnsafeIdentifier(table.to_string()));
    }
    TABLES
        .iter()
        .find(|(name, _)| *name == table)
        .map(|(_, columns)| *columns)
        .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

pub fn validate_column(table: &str, column: &str) -> Result<()> {
    if !is_safe_identifier(column) {
        return Err(StoreError::UnsafeIdentifier(column.to_string()));
    }
    let columns = validate_table(table)?;
    if columns.contains(&column) {
        Ok(())
    } else {
        Err(StoreError::UnknownColumn {
            table: table.to_string(),
            column: column.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_table() {
        assert!(matches!(
            validate_table("drop_table"),
            Err(StoreError::UnknownTable(_))
        ));
    }

    #[test]
    fn rejects_unsafe_identifier() {
        assert!(matches!(
            validate_table("sessions; DROP TABLE sessions"),
            Err(StoreError::UnsafeIdentifier(_))
        ));
    }

    #[test]
    fn accepts_known_table_and_column() {
        assert!(validate_table("sessions").is_ok());
        assert!(validate_column("sessions", "objective").is_ok());
    }

    #[test]
    fn rejects_unknown_column_for_known_table() {
        assert!(matches!(
            validate_column("sessions", "tool_call_count"),
            Err(StoreError::UnknownColumn { .. })
        ));
    }
}
