//! Strict-mode boundary enforcement (`spec.md` §4.7): on denial, revert
//! the offending write, record the violation, and log a critical audit
//! event — for write-like tools only.

use std::path::{Path, PathBuf};

use khoregos_audit::{AuditLogger, LogRequest};
use khoregos_boundary::BoundaryEnforcer;
use khoregos_store::model::{EnforcementAction, EventType, Severity, ViolationType};

use crate::error::Result;

const WRITE_LIKE_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "Bash"];

pub fn is_write_like(tool_name: &str) -> bool {
    WRITE_LIKE_TOOLS.contains(&tool_name)
}

/// Enforce strict-mode boundaries for every file touched by one tool
/// call. Returns the ids of any violations recorded; a non-empty result
/// escalates the primary event's severity.
pub fn enforce(
    logger: &AuditLogger,
    enforcer: &BoundaryEnforcer,
    project_root: &Path,
    agent_id: &str,
    agent_name: &str,
    files: &[String],
) -> Result<Vec<String>> {
    let mut violation_ids = Vec::new();
    for file in files {
        let absolute = resolve_absolute(project_root, file);
        let (allowed, reason) = enforcer.check_path_allowed(&absolute, agent_name);
        if allowed {
            continue;
        }

        let captured = khoregos_boundary::revert_file(&absolute, project_root);
        let enforcement_action = if revert_succeeded(&absolute, captured.as_deref()) {
            EnforcementAction::Reverted
        } else {
            EnforcementAction::RevertFailed
        };
        let details = serde_json::json!({
            "reason": reason,
            "violating_content": captured.as_deref().map(|c| truncate_chars(c, 500)),
        });

        let violation = enforcer.record_violation(
            file,
            Some(agent_id),
            classify_violation(reason.as_deref()),
            enforcement_action,
            Some(details.clone()),
        )?;
        violation_ids.push(violation.id);
        logger.log(
            LogRequest::new(
                EventType::BoundaryViolation,
                format!("strict enforcement: {}", reason.unwrap_or_default()),
            )
            .with_agent(agent_id.to_string())
            .with_files(vec![file.clone()])
            .with_severity(Severity::Critical)
            .with_details(details),
        )?;
    }
    Ok(violation_ids)
}

fn resolve_absolute(project_root: &Path, file: &str) -> PathBuf {
    let path = Path::new(file);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_root.join(path)
    }
}

fn classify_violation(reason: Option<&str>) -> ViolationType {
    match reason {
        Some(r) if r.starts_with("Path matches forbidden pattern") => ViolationType::ForbiddenPath,
        _ => ViolationType::OutsideAllowed,
    }
}

/// `revert_file` swallows its own failures, so success is inferred from
/// the file's post-revert state: gone (the untracked case) or changed
/// from what was captured as violating (restored to HEAD).
fn revert_succeeded(absolute_path: &Path, captured: Option<&str>) -> bool {
    if !absolute_path.exists() {
        return true;
    }
    std::fs::read_to_string(absolute_path).ok().as_deref() != captured
}

fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_like_tools_are_recognized() {
        assert!(is_write_like("Write"));
        assert!(is_write_like("Bash"));
        assert!(!is_write_like("Read"));
    }

    #[test]
    fn classifies_forbidden_pattern_reason() {
        assert_eq!(
            classify_violation(Some("Path matches forbidden pattern: **/secrets/**")),
            ViolationType::ForbiddenPath
        );
    }

    #[test]
    fn classifies_everything_else_as_outside_allowed() {
        assert_eq!(
            classify_violation(Some("no boundary configured")),
            ViolationType::OutsideAllowed
        );
        assert_eq!(classify_violation(None), ViolationType::OutsideAllowed);
    }

    #[test]
    fn truncates_long_content() {
        let long = "x".repeat(600);
        assert_eq!(truncate_chars(&long, 500).chars().count(), 500);
    }
}
