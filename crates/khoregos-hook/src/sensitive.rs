//! Sensitive-file annotation (`spec.md` §4.7, GLOSSARY "Review rule"):
//! write-like tool calls touching a path matched by a configured review
//! rule get a `gate_triggered` event, surfaced as `sensitive_needs_review`.

use khoregos_audit::{AuditLogger, LogRequest};
use khoregos_store::model::{EventType, Severity};

use crate::error::Result;

pub fn annotate(
    logger: &AuditLogger,
    agent_id: &str,
    files: &[String],
    review_rules: &[String],
) -> Result<Vec<String>> {
    let mut triggered = Vec::new();
    for file in files {
        for rule in review_rules {
            if khoregos_boundary::matching::matches(rule, file) {
                let event = logger.log(
                    LogRequest::new(EventType::GateTriggered, EventType::GateTriggered.display_name())
                        .with_agent(agent_id.to_string())
                        .with_files(vec![file.clone()])
                        .with_gate(rule.clone())
                        .with_severity(Severity::Warning),
                )?;
                triggered.push(event.id);
            }
        }
    }
    Ok(triggered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use khoregos_audit::AuditLogger;
    use khoregos_store::Store;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn matching_file_triggers_one_gate_event_per_rule() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let logger = AuditLogger::start(store, "sess-1".to_string(), None, None).unwrap();
        let triggered = annotate(
            &logger,
            "agent-1",
            &["config/auth/login.rs".to_string()],
            &["**/auth/**".to_string()],
        )
        .unwrap();
        assert_eq!(triggered.len(), 1);
    }

    #[test]
    fn non_matching_file_triggers_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(Store::new(dir.path()));
        store.connect().unwrap();
        let logger = AuditLogger::start(store, "sess-1".to_string(), None, None).unwrap();
        let triggered = annotate(&logger, "agent-1", &["notes.md".to_string()], &["**/auth/**".to_string()])
            .unwrap();
        assert!(triggered.is_empty());
    }
}
