//! Schema migrations. An ordered list of `(version, statements)`; each
//! unapplied version runs inside its own transaction, then its version
//! row is recorded. Versions are monotone and never reordered.

pub struct Migration {
    pub version: i64,
    pub statements: &'static [&'static str],
}

pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        r#"CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            objective TEXT,
            state TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            parent_session_id TEXT,
            config_snapshot TEXT,
            context_summary TEXT,
            metadata TEXT,
            operator TEXT,
            hostname TEXT,
            k6s_version TEXT,
            agent_runtime_version TEXT,
            git_branch TEXT,
            git_sha TEXT,
            git_dirty INTEGER,
            trace_id TEXT
        )"#,
        r#"CREATE TABLE IF NOT EXISTS agents (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            name TEXT NOT NULL,
            role TEXT,
            specialization TEXT,
            state TEXT NOT NULL,
            spawned_at TEXT NOT NULL,
            boundary_config TEXT,
            metadata TEXT,
            external_session_id TEXT,
            tool_call_count INTEGER NOT NULL DEFAULT 0
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_agents_session_id ON agents(session_id)",
        r#"CREATE TABLE IF NOT EXISTS audit_events (
            id TEXT PRIMARY KEY,
            sequence INTEGER NOT NULL,
            session_id TEXT NOT NULL,
            agent_id TEXT,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            action TEXT NOT NULL,
            details TEXT,
            files_affected TEXT,
            gate_id TEXT,
            hmac TEXT,
            severity TEXT NOT NULL
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_audit_events_session_sequence ON audit_events(session_id, sequence)",
        "CREATE INDEX IF NOT EXISTS idx_audit_events_event_type ON audit_events(event_type)",
        "CREATE INDEX IF NOT EXISTS idx_audit_events_agent_id ON audit_events(agent_id)",
        r#"CREATE TABLE IF NOT EXISTS context_store (
            key TEXT NOT NULL,
            session_id TEXT NOT NULL,
            agent_id TEXT,
            value TEXT,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (key, session_id)
        )"#,
        r#"CREATE TABLE IF NOT EXISTS file_locks (
            path TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            agent_id TEXT NOT NULL,
            acquired_at TEXT NOT NULL,
            expires_at TEXT
        )"#,
        r#"CREATE TABLE IF NOT EXISTS boundary_violations (
            id TEXT PRIMARY KEY,
            session_id TEXT NOT NULL,
            agent_id TEXT,
            timestamp TEXT NOT NULL,
            file_path TEXT NOT NULL,
            violation_type TEXT NOT NULL,
            enforcement_action TEXT NOT NULL,
            details TEXT
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_boundary_violations_session_id ON boundary_violations(session_id)",
        r#"CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )"#,
    ],
}];
